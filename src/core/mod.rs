//! Core logger types: records, levels, errors, configuration and the dispatcher

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod log_level;
pub mod log_record;
pub mod metrics;
pub mod reporter;
pub mod trace;

pub use clock::{Clock, ManualClock};
pub use config::{LogConfig, DEFAULT_KEEP_COUNT};
pub use dispatcher::{DispatcherBuilder, SinkDispatcher, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{LoggerError, Result};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use metrics::DispatchMetrics;
pub use reporter::{ErrorReporter, ReportTarget};
pub use trace::ErrorTrace;
