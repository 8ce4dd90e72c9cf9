//! Copying and compressing rolled-over log files

pub mod job;
pub mod manager;
pub mod metrics;

pub use job::{ArchiveCodec, BackupJob, BackupMode, BackupOutcome, BackupSource};
pub use manager::{BackupManager, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
pub use metrics::BackupMetrics;
