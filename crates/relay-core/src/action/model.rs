use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Column names of the action log, in file order.
pub const LOG_HEADER: [&str; 3] = ["id", "datetime", "action"];

/// Label recorded for the `/start` command.
pub const ACTION_START: &str = "start";
/// Label recorded for the `/help` command.
pub const ACTION_HELP: &str = "help";
/// Label recorded for a message relayed to the model.
pub const ACTION_ANSWER: &str = "answer";

/// One user interaction.
///
/// `action` is an open set of labels, so it stays a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub user_id: i64,
    pub timestamp: DateTime<FixedOffset>,
    pub action: String,
}

impl ActionRecord {
    pub fn new(user_id: i64, action: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            user_id,
            timestamp,
            action: action.into(),
        }
    }

    /// Timestamp as written to the log, e.g. `2024-01-01T10:00:00+00:00`.
    pub fn datetime_field(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }

    /// The row in `LOG_HEADER` order.
    pub fn to_row(&self) -> [String; 3] {
        [
            self.user_id.to_string(),
            self.datetime_field(),
            self.action.clone(),
        ]
    }
}
