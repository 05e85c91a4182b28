//! Append-only CSV action log.

use relay_core::action::{ActionRecord, ActionRecorder, LOG_HEADER};
use relay_core::{RelayError, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;

/// The action log as a CSV file with an `id,datetime,action` header.
///
/// Rows are only ever appended. The file is opened in append mode for every
/// write and no lock is taken, so a single writing process is assumed.
#[derive(Debug, Clone)]
pub struct CsvActionLog {
    path: PathBuf,
}

impl CsvActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// True when the file is missing or has zero length.
    fn needs_header(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.len() == 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(RelayError::io_at(&self.path, e)),
        }
    }
}

impl ActionRecorder for CsvActionLog {
    fn append(&self, record: &ActionRecord) -> Result<()> {
        let write_header = self.needs_header()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RelayError::io_at(&self.path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        if write_header {
            writer.write_record(LOG_HEADER)?;
        }
        writer.write_record(record.to_row())?;

        let file = writer
            .into_inner()
            .map_err(|e| RelayError::io_at(&self.path, e.into_error()))?;
        file.sync_data()
            .map_err(|e| RelayError::io_at(&self.path, e))?;

        tracing::debug!(
            "[ActionLog] Appended '{}' for user {} to {}",
            record.action,
            record.user_id,
            self.path.display()
        );
        Ok(())
    }

    fn log_path(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::TempDir;

    fn record(user_id: i64, ts: &str, action: &str) -> ActionRecord {
        ActionRecord::new(user_id, action, DateTime::parse_from_rfc3339(ts).unwrap())
    }

    #[test]
    fn test_first_append_writes_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_actions.csv");
        let log = CsvActionLog::new(&path);

        log.append(&record(42, "2024-01-01T10:00:00+00:00", "start"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "id,datetime,action\n42,2024-01-01T10:00:00+00:00,start\n"
        );
    }

    #[test]
    fn test_appends_keep_call_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_actions.csv");
        let log = CsvActionLog::new(&path);

        let actions = ["start", "help", "answer", "answer", "help"];
        for (i, action) in actions.iter().enumerate() {
            let ts = format!("2024-01-01T10:0{}:00+00:00", i);
            log.append(&record(i as i64, &ts, action)).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), actions.len() + 1);
        assert_eq!(lines[0], "id,datetime,action");
        assert_eq!(
            lines.iter().filter(|l| **l == "id,datetime,action").count(),
            1
        );
        for (i, action) in actions.iter().enumerate() {
            assert_eq!(
                lines[i + 1],
                format!("{},2024-01-01T10:0{}:00+00:00,{}", i, i, action)
            );
        }
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_actions.csv");
        fs::write(&path, "").unwrap();

        let log = CsvActionLog::new(&path);
        log.append(&record(1, "2024-01-01T10:00:00+00:00", "help"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("id,datetime,action\n"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_existing_rows_are_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_actions.csv");
        let existing = "id,datetime,action\n7,2023-12-31T23:59:59+00:00,start\n";
        fs::write(&path, existing).unwrap();

        let log = CsvActionLog::new(&path);
        log.append(&record(8, "2024-01-01T00:00:00+00:00", "answer"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(existing));
        assert!(content.ends_with("8,2024-01-01T00:00:00+00:00,answer\n"));
    }

    #[test]
    fn test_action_with_comma_is_quoted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_actions.csv");
        let log = CsvActionLog::new(&path);

        log.append(&record(3, "2024-01-01T10:00:00+00:00", "custom,label"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("3,2024-01-01T10:00:00+00:00,\"custom,label\"\n"));
    }

    #[test]
    fn test_missing_parent_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("user_actions.csv");
        let log = CsvActionLog::new(&path);

        let err = log
            .append(&record(1, "2024-01-01T10:00:00+00:00", "start"))
            .unwrap_err();
        assert!(err.is_io());
        assert!(!err.is_permission_denied());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_log_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_actions.csv");
        let log = CsvActionLog::new(&path);
        log.append(&record(42, "2024-01-01T10:00:00+00:00", "start"))
            .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        // root ignores file modes
        if OpenOptions::new().append(true).open(&path).is_ok() {
            return;
        }

        let err = log
            .append(&record(42, "2024-01-01T10:05:00+00:00", "help"))
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,datetime,action\n42,2024-01-01T10:00:00+00:00,start\n"
        );
    }
}
