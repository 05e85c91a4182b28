//! Error types for relaybot.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A shared error type for the whole relay.
///
/// Filesystem errors keep permission failures apart from other I/O so callers can
/// tell a lost audit trail from a transient disk problem.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum RelayError {
    /// Access to a local file was denied
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "CSV"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential rejected by a remote service
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Remote HTTP API returned an error status
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Network/transport failure before a response was received
    #[error("Network error: {0}")]
    Network(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Wraps an `std::io::Error` raised while touching `path`.
    ///
    /// `PermissionDenied` keeps its own variant.
    pub fn io_at(path: &Path, err: std::io::Error) -> Self {
        let message = format!("{}: {}", path.display(), err);
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { message }
        } else {
            Self::Io { message }
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a permission error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Check if this is an IO error (permission errors included)
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::PermissionDenied { .. })
    }

    /// Check if a remote service rejected the credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_)) || matches!(self, Self::Http { status: 401, .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        let message = format!("{} (kind: {:?})", err, err.kind());
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { message }
        } else {
            Self::Io { message }
        }
    }
}

impl From<csv::Error> for RelayError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Self::Serialization {
                format: "CSV".to_string(),
                message: err.to_string(),
            };
        }

        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => Self::from(io_err),
            kind => Self::Serialization {
                format: "CSV".to_string(),
                message: format!("{:?}", kind),
            },
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RelayError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for RelayError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error
impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, RelayError>`.
pub type Result<T> = std::result::Result<T, RelayError>;
