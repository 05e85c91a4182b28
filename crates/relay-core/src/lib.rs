pub mod action;
pub mod agent;
pub mod backup;
pub mod chat;
pub mod config;
pub mod error;

// Re-export common error type
pub use error::{RelayError, Result};
