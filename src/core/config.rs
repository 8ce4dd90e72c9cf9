//! Log configuration values
//!
//! The configuration file itself is read by the host application; this
//! module only interprets the already-parsed `General.Log` section.
//! Malformed values never fail: the default is used and the problem is
//! returned as a [`LoggerError::Config`] warning.

use super::error::LoggerError;
use crate::backup::{ArchiveCodec, BackupMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_KEEP_COUNT: usize = 7;

/// Retention and backup settings consumed by the rotating file sink
///
/// # Examples
///
/// ```
/// use rust_rotating_logger::core::LogConfig;
/// use rust_rotating_logger::backup::{ArchiveCodec, BackupMode};
///
/// let section = serde_json::json!({
///     "LogKeepCount": 14,
///     "LogBackUpMethod": "archive",
///     "ZipMethod": "bz2",
/// });
/// let (config, warnings) = LogConfig::from_log_section(&section);
/// assert!(warnings.is_empty());
/// assert_eq!(config.keep_count, 14);
/// assert_eq!(config.backup_method, BackupMode::Archive);
/// assert_eq!(config.zip_method, ArchiveCodec::Bz2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(rename = "LogKeepCount")]
    pub keep_count: usize,
    #[serde(rename = "LogBackUpMethod")]
    pub backup_method: BackupMode,
    #[serde(rename = "ZipMethod")]
    pub zip_method: ArchiveCodec,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            keep_count: DEFAULT_KEEP_COUNT,
            backup_method: BackupMode::None,
            zip_method: ArchiveCodec::Gzip,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_keep_count(mut self, count: usize) -> Self {
        self.keep_count = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backup_method(mut self, mode: BackupMode) -> Self {
        self.backup_method = mode;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_zip_method(mut self, codec: ArchiveCodec) -> Self {
        self.zip_method = codec;
        self
    }

    /// Read the whole configuration document and use its `General.Log`
    /// section. A missing section yields the defaults without warnings.
    pub fn from_document(document: &Value) -> (Self, Vec<LoggerError>) {
        match document.get("General").and_then(|general| general.get("Log")) {
            Some(section) => Self::from_log_section(section),
            None => (Self::default(), Vec::new()),
        }
    }

    /// Interpret a `Log` section. Every key is optional.
    pub fn from_log_section(section: &Value) -> (Self, Vec<LoggerError>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        if !section.is_object() {
            warnings.push(LoggerError::config("Log", "expected an object"));
            return (config, warnings);
        }

        if let Some(value) = section.get("LogKeepCount") {
            match value.as_u64().and_then(|v| usize::try_from(v).ok()) {
                Some(count) => config.keep_count = count,
                None => warnings.push(LoggerError::config(
                    "LogKeepCount",
                    format!("expected a non-negative integer, got {}", value),
                )),
            }
        }

        if let Some(value) = section.get("LogBackUpMethod") {
            match value.as_str().map(str::parse::<BackupMode>) {
                Some(Ok(mode)) => config.backup_method = mode,
                Some(Err(err)) => warnings.push(err),
                None => warnings.push(LoggerError::config(
                    "LogBackUpMethod",
                    format!("expected a string, got {}", value),
                )),
            }
        }

        if let Some(value) = section.get("ZipMethod") {
            match value.as_str().map(str::parse::<ArchiveCodec>) {
                Some(Ok(codec)) => config.zip_method = codec,
                Some(Err(err)) => warnings.push(err),
                None => warnings.push(LoggerError::config(
                    "ZipMethod",
                    format!("expected a string, got {}", value),
                )),
            }
        }

        (config, warnings)
    }
}
