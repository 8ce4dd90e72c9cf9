//! Formatting macros over [`SinkDispatcher`](crate::core::SinkDispatcher),
//! in the manner of `println!` and `format!`.
//!
//! # Examples
//!
//! ```
//! use rust_rotating_logger::prelude::*;
//! use rust_rotating_logger::info;
//!
//! let logger = SinkDispatcher::builder()
//!     .console(ConsoleSink::with_colors(false).with_writer(std::io::sink()))
//!     .build();
//!
//! let task = "Commission";
//! info!(logger, "Task started: {}", task);
//! ```

/// Log a formatted message at the given level.
///
/// ```
/// # use rust_rotating_logger::prelude::*;
/// # let logger = SinkDispatcher::builder()
/// #     .console(ConsoleSink::with_colors(false).with_writer(std::io::sink()))
/// #     .build();
/// use rust_rotating_logger::log;
/// log!(logger, LogLevel::Warn, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Error, $($arg)+)
    };
}

/// Log at the highest level, shown as `CRITICAL`
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LogLevel, SinkDispatcher};
    use crate::sinks::ConsoleSink;
    use parking_lot::Mutex;
    use std::io::{self, Write};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logger() -> (SinkDispatcher, Captured) {
        let captured = Captured::default();
        let logger = SinkDispatcher::builder()
            .console(ConsoleSink::with_colors(false).with_writer(captured.clone()))
            .build();
        (logger, captured)
    }

    #[test]
    fn test_level_macros() {
        let (logger, captured) = logger();
        logger.set_min_level(LogLevel::Trace);

        trace!(logger, "t {}", 1);
        debug!(logger, "d {}", 2);
        info!(logger, "i {}", 3);
        warn!(logger, "w {}", 4);
        error!(logger, "e {}", 5);
        fatal!(logger, "f {}", 6);

        let text = String::from_utf8_lossy(&captured.0.lock()).into_owned();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].ends_with("TRACE    t 1"));
        assert!(lines[3].ends_with("WARNING  w 4"));
        assert!(lines[5].ends_with("CRITICAL f 6"));
    }

    #[test]
    fn test_filtered_macro_is_counted() {
        let (logger, captured) = logger();
        log!(logger, LogLevel::Debug, "skipped {}", 0);
        assert!(captured.0.lock().is_empty());
        assert_eq!(logger.metrics().filtered(), 1);
    }
}
