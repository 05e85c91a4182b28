//! Local artifact traits: the append-only action log and its derived table.

use std::path::PathBuf;
use thiserror::Error;

use super::model::ActionRecord;
use crate::error::Result;

/// Appends action records to the local log.
///
/// Implementations must only ever add rows. Errors are returned as-is; a
/// `RelayError::PermissionDenied` means the audit trail can no longer be written.
pub trait ActionRecorder: Send + Sync {
    /// Appends one record, writing the header first when the log is missing or empty.
    fn append(&self, record: &ActionRecord) -> Result<()>;

    /// Path of the log file.
    fn log_path(&self) -> PathBuf;
}

/// Rebuilds the derived table from the full action log.
pub trait TableConverter: Send + Sync {
    /// Discards any previous table and writes a new one from the log contents.
    fn regenerate(&self) -> std::result::Result<ConvertReport, ConvertError>;

    /// Path of the derived table file.
    fn table_path(&self) -> PathBuf;
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    /// Number of data rows written (header excluded)
    pub rows: usize,
    /// Whether a previous table was removed first
    pub replaced: bool,
}

/// Reasons a conversion can fail.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("action log not found at {}", .0.display())]
    MissingLog(PathBuf),

    #[error("malformed action log at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write table: {0}")]
    Write(String),

    #[error("conversion task failed: {0}")]
    Task(String),
}
