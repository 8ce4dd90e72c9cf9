//! Backup pipeline counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the backup workers
///
/// # Example
///
/// ```
/// use rust_rotating_logger::backup::BackupMetrics;
///
/// let metrics = BackupMetrics::new();
/// metrics.record_scheduled();
/// metrics.record_completed();
///
/// assert_eq!(metrics.scheduled(), 1);
/// assert_eq!(metrics.completed(), 1);
/// assert_eq!(metrics.failed(), 0);
/// ```
#[derive(Debug)]
pub struct BackupMetrics {
    /// Jobs accepted by the queue
    scheduled: AtomicU64,

    /// Jobs that produced a copy or an archive
    completed: AtomicU64,

    /// Jobs that had nothing to do (archive present, no file to recover)
    skipped: AtomicU64,

    /// Jobs that ended in an error
    failed: AtomicU64,

    /// Jobs rejected because the queue was full or shut down
    dropped: AtomicU64,
}

impl BackupMetrics {
    pub const fn new() -> Self {
        Self {
            scheduled: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Record an accepted job, returning the previous count
    #[inline]
    pub fn record_scheduled(&self) -> u64 {
        self.scheduled.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_completed(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_skipped(&self) -> u64 {
        self.skipped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    /// Jobs accepted but not finished yet
    pub fn outstanding(&self) -> u64 {
        self.scheduled()
            .saturating_sub(self.completed() + self.skipped() + self.failed())
    }
}

impl Default for BackupMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BackupMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            scheduled: AtomicU64::new(self.scheduled()),
            completed: AtomicU64::new(self.completed()),
            skipped: AtomicU64::new(self.skipped()),
            failed: AtomicU64::new(self.failed()),
            dropped: AtomicU64::new(self.dropped()),
        }
    }
}
