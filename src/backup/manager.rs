//! Background execution of backup jobs
//!
//! Rollover must not wait for a copy or a compression, so jobs go to a
//! bounded queue served by a small pool of worker threads. The manager
//! tracks outstanding jobs so callers can wait for them ([`BackupManager::drain`])
//! and joins its workers on [`BackupManager::shutdown`]. Dropping the manager
//! only closes the queue: the workers finish what was accepted and exit on
//! their own, so the thread that drops the last handle never waits.

use super::job::{BackupJob, BackupMode, BackupOutcome};
use super::metrics::BackupMetrics;
use crate::core::error::LoggerError;
use crate::core::reporter::ErrorReporter;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_WORKERS: usize = 1;

struct Shared {
    pending: Mutex<usize>,
    idle: Condvar,
    in_flight: Mutex<HashSet<PathBuf>>,
    metrics: BackupMetrics,
    reporter: ErrorReporter,
}

impl Shared {
    fn finish_one(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

pub struct BackupManager {
    sender: Option<Sender<BackupJob>>,
    workers: Vec<thread::JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl BackupManager {
    pub fn new(reporter: ErrorReporter) -> Self {
        Self::with_workers(DEFAULT_WORKERS, DEFAULT_QUEUE_CAPACITY, reporter)
    }

    pub fn with_workers(workers: usize, capacity: usize, reporter: ErrorReporter) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        let shared = Arc::new(Shared {
            pending: Mutex::new(0),
            idle: Condvar::new(),
            in_flight: Mutex::new(HashSet::new()),
            metrics: BackupMetrics::new(),
            reporter,
        });

        let mut handles = Vec::with_capacity(workers.max(1));
        for index in 0..workers.max(1) {
            let receiver: Receiver<BackupJob> = receiver.clone();
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("log-backup-{}", index))
                .spawn(move || {
                    for job in receiver.iter() {
                        Self::process(&worker_shared, &job);
                        worker_shared.finish_one();
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => shared.reporter.report(&LoggerError::Io(e)),
            }
        }

        Self {
            sender: Some(sender),
            workers: handles,
            shared,
        }
    }

    /// Queue a job without blocking. Returns whether it was accepted.
    ///
    /// Jobs in [`BackupMode::None`] are ignored. A full queue drops the job
    /// and reports a [`LoggerError::Backup`].
    pub fn schedule(&self, job: BackupJob) -> bool {
        if job.mode == BackupMode::None {
            return false;
        }
        let Some(sender) = &self.sender else {
            self.reject(&job, "backup manager is shut down");
            return false;
        };

        *self.shared.pending.lock() += 1;
        match sender.try_send(job) {
            Ok(()) => {
                self.shared.metrics.record_scheduled();
                true
            }
            Err(TrySendError::Full(job)) => {
                self.shared.finish_one();
                self.reject(&job, "backup queue is full");
                false
            }
            Err(TrySendError::Disconnected(job)) => {
                self.shared.finish_one();
                self.reject(&job, "backup workers have stopped");
                false
            }
        }
    }

    fn reject(&self, job: &BackupJob, reason: &str) {
        self.shared.metrics.record_dropped();
        let path = match &job.source {
            super::job::BackupSource::Path(path) => path.display().to_string(),
            super::job::BackupSource::Recover { log_dir, .. } => log_dir.display().to_string(),
        };
        self.shared.reporter.report(&LoggerError::backup(path, reason));
    }

    fn process(shared: &Shared, job: &BackupJob) {
        let source = match job.resolve_source() {
            Ok(Some(source)) => source,
            Ok(None) => {
                shared.metrics.record_skipped();
                return;
            }
            Err(e) => {
                shared.metrics.record_failed();
                shared.reporter.report(&e);
                return;
            }
        };

        if !shared.in_flight.lock().insert(source.clone()) {
            // another worker is already backing this file up
            shared.metrics.record_skipped();
            return;
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| job.run_on(&source)));
        shared.in_flight.lock().remove(&source);

        match result {
            Ok(Ok(BackupOutcome::Skipped)) => {
                shared.metrics.record_skipped();
            }
            Ok(Ok(_)) => {
                shared.metrics.record_completed();
            }
            Ok(Err(e)) => {
                shared.metrics.record_failed();
                shared.reporter.report(&e);
            }
            Err(panic_info) => {
                shared.metrics.record_failed();
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                shared.reporter.report(&LoggerError::backup(
                    source.display().to_string(),
                    format!("backup worker panicked: {}", panic_msg),
                ));
            }
        }
    }

    /// Wait until every accepted job has finished.
    ///
    /// Returns `false` if jobs are still outstanding after `timeout`.
    pub fn drain(&self, timeout: Duration) -> bool {
        let mut pending = self.shared.pending.lock();
        if *pending == 0 {
            return true;
        }
        self.shared
            .idle
            .wait_while_for(&mut pending, |pending| *pending > 0, timeout);
        *pending == 0
    }

    pub fn pending(&self) -> usize {
        *self.shared.pending.lock()
    }

    pub fn metrics(&self) -> &BackupMetrics {
        &self.shared.metrics
    }

    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Stop accepting jobs, let the workers finish the queue, and join them.
    ///
    /// Returns `true` if all workers stopped within `timeout`.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        // Closing the channel lets the workers drain the queue and exit
        drop(self.sender.take());

        let start = Instant::now();
        let mut clean = true;
        for handle in self.workers.drain(..) {
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Backup worker panicked during shutdown: {:?}", e);
                        clean = false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    eprintln!(
                        "[WARN] Backup worker did not finish within {:?}. Pending backups may be incomplete.",
                        timeout
                    );
                    clean = false;
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
        clean
    }
}

impl Drop for BackupManager {
    fn drop(&mut self) {
        // may run on an emitting thread: close the queue and detach
        drop(self.sender.take());
        self.workers.clear();
    }
}

impl std::fmt::Debug for BackupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupManager")
            .field("running", &self.is_running())
            .field("workers", &self.workers.len())
            .field("pending", &self.pending())
            .finish()
    }
}
