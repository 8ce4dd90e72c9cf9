//! Dispatcher metrics for observability
//!
//! Counts what happened to each event on its way to the sinks: delivered,
//! failed, or re-delivered because the sink it was aimed at had just been
//! swapped out.

use std::sync::atomic::{AtomicU64, Ordering};

/// Fan-out counters of a [`SinkDispatcher`](crate::core::SinkDispatcher)
///
/// # Example
///
/// ```
/// use rust_rotating_logger::core::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
/// metrics.record_delivered();
/// metrics.record_delivered();
/// metrics.record_failed();
///
/// assert_eq!(metrics.delivered(), 2);
/// assert_eq!(metrics.failed(), 1);
/// assert!((metrics.failure_rate() - 33.33).abs() < 0.01);
/// ```
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Events emitted through the dispatcher (after level filtering)
    emitted: AtomicU64,

    /// Successful sink deliveries (one event reaching three sinks counts three)
    delivered: AtomicU64,

    /// Sink deliveries that returned an error or panicked
    failed: AtomicU64,

    /// Deliveries redirected to a replacement sink after a swap
    rerouted: AtomicU64,

    /// Events below the minimum level
    filtered: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            emitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rerouted: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rerouted(&self) -> u64 {
        self.rerouted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rerouted(&self) -> u64 {
        self.rerouted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage of all deliveries (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been delivered yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed() as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.emitted.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.rerouted.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DispatchMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            emitted: AtomicU64::new(self.emitted()),
            delivered: AtomicU64::new(self.delivered()),
            failed: AtomicU64::new(self.failed()),
            rerouted: AtomicU64::new(self.rerouted()),
            filtered: AtomicU64::new(self.filtered()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.emitted(), 0);
        assert_eq!(metrics.delivered(), 0);
        assert_eq!(metrics.failed(), 0);
        assert_eq!(metrics.rerouted(), 0);
        assert_eq!(metrics.filtered(), 0);
        assert_eq!(metrics.failure_rate(), 0.0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.record_rerouted(), 0);
        assert_eq!(metrics.record_rerouted(), 1);
        assert_eq!(metrics.rerouted(), 2);
    }

    #[test]
    fn test_reset() {
        let metrics = DispatchMetrics::new();
        metrics.record_emitted();
        metrics.record_failed();
        metrics.record_filtered();
        metrics.reset();
        assert_eq!(metrics.emitted(), 0);
        assert_eq!(metrics.failed(), 0);
        assert_eq!(metrics.filtered(), 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let metrics = DispatchMetrics::new();
        metrics.record_delivered();
        let snapshot = metrics.clone();
        metrics.record_delivered();
        assert_eq!(snapshot.delivered(), 1);
        assert_eq!(metrics.delivered(), 2);
    }
}
