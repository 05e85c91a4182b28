use anyhow::{Context, Result};
use relay_infrastructure::ConfigService;

pub fn run(config: &ConfigService) -> Result<()> {
    let secret_path = config
        .paths()
        .ensure_secret_file()
        .context("Failed to create secret.json")?;
    println!("Secrets:  {}", secret_path.display());

    match config.write_default_settings()? {
        Some(path) => println!("Settings: {} (created)", path.display()),
        None => println!("Settings: already present, left unchanged"),
    }

    println!("Fill in the tokens in secret.json, then start the bot with `relaybot run`.");
    Ok(())
}
