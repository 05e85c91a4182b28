//! Startup preparation of the local artifacts.

use relay_core::backup::BackupConfig;
use relay_core::{RelayError, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Creates the log and table files (empty, mode 644) when they don't exist yet.
///
/// Returns the paths that were created. Existing files are left untouched; the
/// empty log gets its header on the first append.
pub fn ensure_artifacts(config: &BackupConfig) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for path in [&config.log_path, &config.table_path] {
        if touch(path)? {
            tracing::info!("[Artifacts] Created {}", path.display());
            created.push(path.clone());
        }
    }
    Ok(created)
}

fn touch(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| RelayError::io_at(parent, e))?;
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    match options.open(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(RelayError::io_at(path, e)),
    }
}
