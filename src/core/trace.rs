//! Error trace payload attached to log records

use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;

/// Captured information about an error: its kind, message, the chain of
/// `source()` causes and, when enabled, a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTrace {
    pub kind: String,
    pub message: String,
    pub causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtrace: Option<String>,
}

impl ErrorTrace {
    /// Build a trace from an error without capturing a backtrace
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            kind: short_type_name::<E>().to_string(),
            message: err.to_string(),
            causes,
            backtrace: None,
        }
    }

    /// Build a trace and capture a backtrace of the current thread.
    ///
    /// The backtrace is only kept when capturing is enabled through
    /// `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`.
    pub fn capture<E: Error + ?Sized>(err: &E) -> Self {
        let mut trace = Self::from_error(err);
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            trace.backtrace = Some(backtrace.to_string());
        }
        trace
    }

    /// `Kind: message`, the one-line form used for the log record itself
    #[must_use]
    pub fn headline(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // keep generic arguments intact, only strip the leading module path
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
