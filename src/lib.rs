//! # Rust Rotating Logger
//!
//! Time-based rotating log files with background backups, fanned out from
//! one dispatcher to a console, a file and an optional host callback.
//!
//! ## Features
//!
//! - **Calendar rotation**: seconds to weekly periods, in local time, UTC or
//!   any IANA zone, with DST-aware midnight boundaries
//! - **History retention**: dated files `<date>_<name>` pruned to a keep count
//! - **Background backups**: copy or gzip/bzip2 archives on worker threads
//! - **Hot-swappable sinks**: replacing a sink never loses an event
//! - **Error routing**: a failing sink's errors show up in the others
//!
//! ## Example
//!
//! ```
//! use rust_rotating_logger::prelude::*;
//!
//! let logger = SinkDispatcher::builder()
//!     .console(ConsoleSink::with_colors(false).with_writer(std::io::sink()))
//!     .build();
//!
//! logger.header("Startup", 1);
//! logger.attr("Server", "cn");
//! logger.attr_align("Task", "Commission", "", 22);
//! assert!(logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT));
//! ```

pub mod backup;
pub mod core;
pub mod macros;
pub mod render;
pub mod rotation;
pub mod sinks;

pub mod prelude {
    pub use crate::backup::{ArchiveCodec, BackupMode};
    pub use crate::core::{
        Clock, DispatcherBuilder, ErrorTrace, LogConfig, LogLevel, LogRecord, LoggerError,
        ManualClock, Result, SinkDispatcher, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::render::{RenderCapability, Renderable, Rule, TextRenderer};
    pub use crate::rotation::{RotationPolicy, RotationZone, When};
    pub use crate::sinks::{CallbackSink, ConsoleSink, RotatingFileSink, SinkKind};
}

pub use crate::core::{
    DispatchMetrics, DispatcherBuilder, ErrorTrace, LogConfig, LogLevel, LogRecord, LoggerError,
    Result, SinkDispatcher, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::sinks::{CallbackSink, ConsoleSink, RotatingFileSink, SinkKind};
