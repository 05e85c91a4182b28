//! Atomic TOML file operations.
//!
//! Loads a TOML document into a typed value and saves it back with a
//! tmp file + rename, so a crash never leaves a half-written config.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during TOML file operations.
#[derive(Debug)]
pub enum TomlFileError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML deserialization error.
    TomlError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
}

impl std::fmt::Display for TomlFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TomlFileError::IoError(e) => write!(f, "I/O error: {}", e),
            TomlFileError::TomlError(e) => write!(f, "TOML parse error: {}", e),
            TomlFileError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
        }
    }
}

impl std::error::Error for TomlFileError {}

impl From<std::io::Error> for TomlFileError {
    fn from(e: std::io::Error) -> Self {
        TomlFileError::IoError(e)
    }
}

impl From<toml::de::Error> for TomlFileError {
    fn from(e: toml::de::Error) -> Self {
        TomlFileError::TomlError(e)
    }
}

impl From<toml::ser::Error> for TomlFileError {
    fn from(e: toml::ser::Error) -> Self {
        TomlFileError::TomlSerError(e)
    }
}

/// A handle to a TOML file holding one `T`.
pub struct TomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> TomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, TomlFileError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = toml::from_str(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the file atomically (tmp file, fsync, rename).
    pub fn save(&self, data: &T) -> Result<(), TomlFileError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf, TomlFileError> {
        let parent = self.path.parent().ok_or_else(|| {
            TomlFileError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            TomlFileError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }
}
