//! Routing of internal errors
//!
//! Sinks and backup workers cannot return their I/O failures to whoever
//! logged the record, so they hand them to an [`ErrorReporter`]. Once the
//! sink is registered with a dispatcher the reporter forwards to it, and the
//! error shows up as an error line in the other sinks. Until then, or after
//! the dispatcher is gone, it falls back to stderr.

use super::error::LoggerError;
use crate::sinks::SinkKind;
use arc_swap::ArcSwapOption;
use std::sync::{Arc, Weak};

/// Receiver of errors raised inside a sink of kind `origin`
pub trait ReportTarget: Send + Sync {
    fn report(&self, origin: SinkKind, error: &LoggerError);
}

struct ReportHook {
    target: Weak<dyn ReportTarget>,
    origin: SinkKind,
}

/// Cloneable handle; all clones share the same connection
#[derive(Clone, Default)]
pub struct ErrorReporter {
    hook: Arc<ArcSwapOption<ReportHook>>,
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, target: Weak<dyn ReportTarget>, origin: SinkKind) {
        self.hook.store(Some(Arc::new(ReportHook { target, origin })));
    }

    pub fn disconnect(&self) {
        self.hook.store(None);
    }

    pub fn is_connected(&self) -> bool {
        self.hook
            .load()
            .as_ref()
            .is_some_and(|hook| hook.target.strong_count() > 0)
    }

    pub fn report(&self, error: &LoggerError) {
        let hook = self.hook.load_full();
        if let Some(hook) = hook {
            if let Some(target) = hook.target.upgrade() {
                target.report(hook.origin, error);
                return;
            }
        }
        eprintln!("[LOGGER ERROR] {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collector {
        seen: Mutex<Vec<(SinkKind, String)>>,
    }

    impl ReportTarget for Collector {
        fn report(&self, origin: SinkKind, error: &LoggerError) {
            self.seen.lock().push((origin, error.to_string()));
        }
    }

    #[test]
    fn test_reports_reach_connected_target() {
        let collector = Arc::new(Collector::default());
        let reporter = ErrorReporter::new();
        let clone = reporter.clone();

        let target: Arc<dyn ReportTarget> = collector.clone();
        reporter.connect(Arc::downgrade(&target), SinkKind::RotatingFile);
        assert!(clone.is_connected());

        clone.report(&LoggerError::backup("a.txt", "queue full"));
        let seen = collector.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, SinkKind::RotatingFile);
        assert!(seen[0].1.contains("queue full"));
    }

    #[test]
    fn test_dead_target_falls_back() {
        let reporter = ErrorReporter::new();
        {
            let target: Arc<dyn ReportTarget> = Arc::new(Collector::default());
            reporter.connect(Arc::downgrade(&target), SinkKind::Console);
            assert!(reporter.is_connected());
        }
        assert!(!reporter.is_connected());
        // goes to stderr, must not panic
        reporter.report(&LoggerError::closed_sink("console"));

        reporter.disconnect();
        assert!(!reporter.is_connected());
    }
}
