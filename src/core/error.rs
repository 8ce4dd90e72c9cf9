//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// File open/write/rename/flush failure inside a sink
    #[error("Sink IO error while {operation} '{path}': {source}")]
    SinkIo {
        path: String,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Backup copy or compression failure
    #[error("Backup failed for '{path}': {message}")]
    Backup {
        path: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Emit called on a sink that has already been closed
    #[error("Sink '{sink}' is closed")]
    ClosedSink { sink: String },

    /// Malformed configuration value; the default is used instead
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    /// A sink panicked while handling an event
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoggerError {
    /// Create a sink IO error with the failing operation and path
    pub fn sink_io(
        path: impl Into<String>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::SinkIo {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a backup error without an underlying IO error
    pub fn backup(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Backup {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a backup error caused by an IO error
    pub fn backup_io(
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::Backup {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn closed_sink(sink: impl Into<String>) -> Self {
        LoggerError::ClosedSink { sink: sink.into() }
    }

    /// Create a configuration error
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Whether this error only means the sink was swapped out and closed
    #[must_use]
    pub fn is_closed_sink(&self) -> bool {
        matches!(self, LoggerError::ClosedSink { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::closed_sink("rotating_file");
        assert!(matches!(err, LoggerError::ClosedSink { .. }));
        assert!(err.is_closed_sink());

        let err = LoggerError::config("LogKeepCount", "expected a non-negative integer");
        assert!(matches!(err, LoggerError::Config { .. }));
        assert!(!err.is_closed_sink());

        let err = LoggerError::backup("./log/2024-01-01_app.txt", "source missing");
        assert!(matches!(err, LoggerError::Backup { source: None, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::closed_sink("console");
        assert_eq!(err.to_string(), "Sink 'console' is closed");

        let err = LoggerError::config("ZipMethod", "unknown codec 'xz'");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for ZipMethod: unknown codec 'xz'"
        );

        let err = LoggerError::sink_panicked("callback", "boom");
        assert_eq!(err.to_string(), "Sink 'callback' panicked: boom");
    }

    #[test]
    fn test_sink_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::sink_io("/var/log/app.txt", "opening", io_err);

        assert!(matches!(err, LoggerError::SinkIo { .. }));
        assert!(err.to_string().contains("opening"));
        assert!(err.to_string().contains("/var/log/app.txt"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_backup_io_error_has_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = LoggerError::backup_io("a.txt", "cannot open source", io_err);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("cannot open source"));
    }
}
