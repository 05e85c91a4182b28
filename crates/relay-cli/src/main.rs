use anyhow::Result;
use clap::{Parser, Subcommand};
use relay_infrastructure::{ConfigService, RelayPaths};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(about = "relaybot - Telegram relay to YandexGPT with a backed-up action log", long_about = None)]
struct Cli {
    /// Directory holding config.toml and secret.json
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Run the bot until Ctrl-C (default)
    Run,
    /// Validate configuration and the remote storage credential
    Check,
    /// Write a secret.json template and a default config.toml
    Init,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = ConfigService::new(RelayPaths::new(cli.config_dir.as_deref()));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&config).await?,
        Commands::Check => commands::check::run(&config).await?,
        Commands::Init => commands::init::run(&config)?,
    }

    Ok(())
}
