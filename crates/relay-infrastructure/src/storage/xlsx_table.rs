//! Spreadsheet export of the action log.

use relay_core::action::{ConvertError, ConvertReport, LOG_HEADER, TableConverter};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Rebuilds an `.xlsx` workbook from the CSV action log.
///
/// The workbook is never patched: every call removes the old file and writes a
/// fresh one from the full log. Cells are written as text, exactly as they appear
/// in the log.
#[derive(Debug, Clone)]
pub struct XlsxTableConverter {
    log_path: PathBuf,
    table_path: PathBuf,
}

impl XlsxTableConverter {
    pub fn new(log_path: impl Into<PathBuf>, table_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            table_path: table_path.into(),
        }
    }

    /// Removes the previous table. Returns whether one existed.
    fn remove_previous(&self) -> Result<bool, ConvertError> {
        match fs::remove_file(&self.table_path) {
            Ok(()) => {
                tracing::info!(
                    "[TableConverter] Removed previous table {}",
                    self.table_path.display()
                );
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConvertError::Io(e)),
        }
    }
}

impl TableConverter for XlsxTableConverter {
    fn regenerate(&self) -> Result<ConvertReport, ConvertError> {
        if !self.log_path.exists() {
            return Err(ConvertError::MissingLog(self.log_path.clone()));
        }

        let replaced = self.remove_previous()?;
        let rows = read_log_rows(&self.log_path)?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, name) in LOG_HEADER.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *name)
                .map_err(|e| ConvertError::Write(e.to_string()))?;
        }
        for (index, row) in rows.iter().enumerate() {
            let row_num = u32::try_from(index + 1)
                .map_err(|_| ConvertError::Write("too many rows for a worksheet".into()))?;
            for (col, value) in row.iter().enumerate() {
                worksheet
                    .write_string(row_num, col as u16, value.as_str())
                    .map_err(|e| ConvertError::Write(e.to_string()))?;
            }
        }

        workbook
            .save(&self.table_path)
            .map_err(|e| ConvertError::Write(e.to_string()))?;

        tracing::info!(
            "[TableConverter] Converted {} into {} ({} rows)",
            self.log_path.display(),
            self.table_path.display(),
            rows.len()
        );

        Ok(ConvertReport {
            rows: rows.len(),
            replaced,
        })
    }

    fn table_path(&self) -> PathBuf {
        self.table_path.clone()
    }
}

/// Reads every data row of the log, checking the header and row width.
fn read_log_rows(path: &Path) -> Result<Vec<Vec<String>>, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_error(e, 1))?;

    let header = reader.headers().map_err(|e| csv_error(e, 1))?;
    if header.iter().ne(LOG_HEADER.iter().copied()) {
        return Err(ConvertError::Malformed {
            line: 1,
            message: format!(
                "expected header '{}', found '{}'",
                LOG_HEADER.join(","),
                header.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(e, index as u64 + 2))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn csv_error(err: csv::Error, fallback_line: u64) -> ConvertError {
    let line = err
        .position()
        .map(|pos| pos.line())
        .unwrap_or(fallback_line);
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io_err) = err.into_kind() {
            return ConvertError::Io(io_err);
        }
        return ConvertError::Malformed {
            line,
            message: "unreadable log".into(),
        };
    }
    ConvertError::Malformed {
        line,
        message: err.to_string(),
    }
}
