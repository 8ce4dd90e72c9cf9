//! Log record structure

use super::log_level::LogLevel;
use super::trace::ErrorTrace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of one log event.
///
/// Records are built by the logging call and only read afterwards; every
/// sink renders the same record through its own path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<ErrorTrace>,
    /// Render the message in bold on styled surfaces
    #[serde(default)]
    pub emphasis: bool,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a record always occupies exactly one line in the log file.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            timestamp: Utc::now(),
            trace: None,
            emphasis: false,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: ErrorTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    #[must_use]
    pub fn emphasized(mut self) -> Self {
        self.emphasis = true;
        self
    }
}
