//! Time-rotated log file sink
//!
//! The sink always writes to one canonical file, e.g. `./log/app.txt`. When
//! the rotation policy says a boundary has passed, the file is renamed to
//! `<date>_app.txt`, a backup job is queued, old historical files beyond the
//! keep count are deleted, and a fresh canonical file is opened.
//!
//! I/O failures never reach the caller of [`RotatingFileSink::emit`]; they
//! are reported through the sink's [`ErrorReporter`] and the sink keeps
//! going, reopening its file on the next write if needed.

use super::Event;
use crate::backup::{ArchiveCodec, BackupJob, BackupManager, BackupMetrics, BackupMode};
use crate::core::clock::Clock;
use crate::core::config::{LogConfig, DEFAULT_KEEP_COUNT};
use crate::core::error::{LoggerError, Result};
use crate::core::reporter::ErrorReporter;
use crate::render::RenderCapability;
use crate::rotation::history::{self, HistoryPattern};
use crate::rotation::{RotationPolicy, RotationState, RotationZone, When};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Column width used when renderables are written to the file
pub const DEFAULT_FILE_WIDTH: usize = 119;
pub const DEFAULT_LOG_DIR: &str = "./log";
pub const BACKUP_DIR_NAME: &str = "bak";

/// Builder for [`RotatingFileSink`]
///
/// # Examples
///
/// ```
/// use rust_rotating_logger::backup::{ArchiveCodec, BackupMode};
/// use rust_rotating_logger::rotation::{RotationZone, When};
/// use rust_rotating_logger::sinks::RotatingFileSink;
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = RotatingFileSink::builder("app")
///     .dir(dir.path())
///     .when(When::Midnight)
///     .zone(RotationZone::Utc)
///     .backup_count(7)
///     .backup_mode(BackupMode::Archive)
///     .codec(ArchiveCodec::Bz2)
///     .build()
///     .unwrap();
///
/// assert_eq!(sink.path(), dir.path().join("app.txt"));
/// assert!(sink.path().exists());
/// ```
#[derive(Debug, Clone)]
pub struct RotatingFileSinkBuilder {
    path: PathBuf,
    policy: RotationPolicy,
    backup_count: usize,
    backup_mode: BackupMode,
    codec: ArchiveCodec,
    backup_retention: Option<usize>,
    backup_workers: usize,
    clock: Clock,
    width: usize,
}

impl RotatingFileSinkBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            path: Path::new(DEFAULT_LOG_DIR).join(format!("{}.txt", name)),
            policy: RotationPolicy::default(),
            backup_count: DEFAULT_KEEP_COUNT,
            backup_mode: BackupMode::None,
            codec: ArchiveCodec::Gzip,
            backup_retention: None,
            backup_workers: crate::backup::DEFAULT_WORKERS,
            clock: Clock::System,
            width: DEFAULT_FILE_WIDTH,
        }
    }

    /// Canonical file path; overrides the default `./log/<name>.txt`
    #[must_use = "builder methods return a new value"]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Keep the file name but place it in `dir`
    #[must_use = "builder methods return a new value"]
    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        self.path = dir.as_ref().join(file_name);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn when(mut self, when: When) -> Self {
        self.policy.when = when;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn interval(mut self, interval: u32) -> Self {
        self.policy = self.policy.with_interval(interval);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn zone(mut self, zone: RotationZone) -> Self {
        self.policy.zone = zone;
        self
    }

    /// Historical files to keep next to the canonical file, 0 keeps all
    #[must_use = "builder methods return a new value"]
    pub fn backup_count(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backup_mode(mut self, mode: BackupMode) -> Self {
        self.backup_mode = mode;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn codec(mut self, codec: ArchiveCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Backups to keep in `bak/`, `None` keeps all
    #[must_use = "builder methods return a new value"]
    pub fn backup_retention(mut self, retain: Option<usize>) -> Self {
        self.backup_retention = retain;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backup_workers(mut self, workers: usize) -> Self {
        self.backup_workers = workers.max(1);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: impl Into<Clock>) -> Self {
        self.clock = clock.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Apply keep count and backup settings from a [`LogConfig`]
    #[must_use = "builder methods return a new value"]
    pub fn config(self, config: &LogConfig) -> Self {
        self.backup_count(config.keep_count)
            .backup_mode(config.backup_method)
            .codec(config.zip_method)
    }

    /// Create the log directory and open the canonical file.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::SinkIo`] if the directory cannot be created or
    /// the canonical file cannot be opened.
    pub fn build(self) -> Result<RotatingFileSink> {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                LoggerError::sink_io(
                    self.path.display().to_string(),
                    "resolve file name",
                    io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?;

        let dir = log_dir(&self.path);
        fs::create_dir_all(&dir).map_err(|e| {
            LoggerError::sink_io(dir.display().to_string(), "create log directory", e)
        })?;

        let reporter = ErrorReporter::new();
        let now = self.clock.now();
        let name = Path::new(&file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&file_name)
            .to_string();

        let mut sink = RotatingFileSink {
            name,
            pattern: HistoryPattern::new(file_name, self.policy.date_format()),
            state: RotationState::new(self.path.clone(), now, self.backup_count),
            policy: self.policy,
            writer: None,
            backups: BackupManager::with_workers(
                self.backup_workers,
                crate::backup::DEFAULT_QUEUE_CAPACITY,
                reporter.clone(),
            ),
            backup_mode: self.backup_mode,
            codec: self.codec,
            backup_retention: self.backup_retention,
            clock: self.clock,
            reporter,
            width: self.width,
            closed: false,
        };

        sink.start(now)?;
        Ok(sink)
    }
}

fn log_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub struct RotatingFileSink {
    name: String,
    policy: RotationPolicy,
    state: RotationState,
    pattern: HistoryPattern,
    writer: Option<BufWriter<File>>,
    backups: BackupManager,
    backup_mode: BackupMode,
    codec: ArchiveCodec,
    backup_retention: Option<usize>,
    clock: Clock,
    reporter: ErrorReporter,
    width: usize,
    closed: bool,
}

impl RotatingFileSink {
    pub fn builder(name: &str) -> RotatingFileSinkBuilder {
        RotatingFileSinkBuilder::new(name)
    }

    /// Sink writing to `path`, configured from `config`, with the system clock
    ///
    /// # Errors
    ///
    /// See [`RotatingFileSinkBuilder::build`].
    pub fn from_config(path: impl Into<PathBuf>, config: &LogConfig) -> Result<Self> {
        let path = path.into();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("log")
            .to_string();
        RotatingFileSinkBuilder::new(&name)
            .path(path)
            .config(config)
            .build()
    }

    /// File stem, e.g. `app` for `./log/app.txt`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical path of the active file
    pub fn path(&self) -> &Path {
        &self.state.current_file
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn pattern(&self) -> &HistoryPattern {
        &self.pattern
    }

    pub fn backup_dir(&self) -> PathBuf {
        log_dir(&self.state.current_file).join(BACKUP_DIR_NAME)
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn backup_metrics(&self) -> &BackupMetrics {
        self.backups.metrics()
    }

    /// Historical files of this sink, oldest first
    pub fn history(&self) -> Vec<PathBuf> {
        self.pattern
            .list(&log_dir(&self.state.current_file))
            .unwrap_or_default()
    }

    /// Wait until queued backups have finished
    pub fn wait_for_backups(&self, timeout: Duration) -> bool {
        self.backups.drain(timeout)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Archive a canonical file left over from a previous run if a rollover
    /// boundary has passed since it was written, then open the canonical file
    fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        let path = self.state.current_file.clone();
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let mut archived = None;
        if let Some(modified) = modified {
            let since = RotationState::new(path.clone(), modified, self.state.backup_count);
            let boundary = self.policy.compute_next(modified, &since);
            if now >= boundary {
                self.state.period_start = modified;
                archived = self.archive_current();
                self.prune_history();
                self.state.period_start = now;
            } else {
                self.state.period_start = modified.min(now);
            }
        }

        self.state.next_rollover_at = self.policy.compute_next(now, &self.state);

        // the file archived above already has its own job
        let mut recover = BackupJob::recover(log_dir(&path), self.backup_dir(), self.pattern.clone());
        if let Some(archived) = archived {
            recover = recover.excluding(archived);
        }
        self.backups.schedule(
            recover
                .with_mode(self.backup_mode)
                .with_codec(self.codec)
                .with_retain(self.backup_retention),
        );

        self.writer = Some(Self::open(&path)?);
        Ok(())
    }

    fn open(path: &Path) -> Result<BufWriter<File>> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(BufWriter::new)
            .map_err(|e| LoggerError::sink_io(path.display().to_string(), "open log file", e))
    }

    /// Try to reopen the log file (used for recovery after a failed rollover or write)
    fn try_reopen(&mut self) -> bool {
        match Self::open(&self.state.current_file) {
            Ok(writer) => {
                self.writer = Some(writer);
                true
            }
            Err(e) => {
                self.reporter.report(&e);
                false
            }
        }
    }

    /// Roll over now, whether or not a boundary has passed.
    ///
    /// # Errors
    ///
    /// Only [`LoggerError::ClosedSink`]; I/O problems are reported.
    pub fn rollover(&mut self) -> Result<()> {
        if self.closed {
            return Err(LoggerError::closed_sink(self.name.clone()));
        }
        let now = self.clock.now();
        self.roll(now);
        Ok(())
    }

    fn roll(&mut self, now: DateTime<Utc>) {
        // 1. flush and close the active handle
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                self.reporter.report(&LoggerError::sink_io(
                    self.state.current_file.display().to_string(),
                    "flush before rollover",
                    e,
                ));
            }
        }

        // 2. and 3. rename to the historical name and queue the backup
        self.archive_current();

        // 4. prune old historical files
        self.prune_history();

        // 5. next boundary, and the start of the period we are entering
        let previous = self.state.next_rollover_at;
        if self.policy.is_due(now, &self.state) {
            self.state.next_rollover_at = self.policy.compute_next(now, &self.state);
            self.state.period_start = if now - previous < self.policy.interval() {
                previous
            } else {
                now
            };
        } else {
            self.state.period_start = now;
        }

        // 6. reopen the canonical file
        self.try_reopen();
    }

    /// Move the canonical file to its historical name and queue its backup.
    /// An existing historical file of the same name is appended to.
    /// Returns the historical file on success.
    fn archive_current(&mut self) -> Option<PathBuf> {
        let source = self.state.current_file.clone();
        if !source.exists() {
            return None;
        }

        let date = self.policy.format_period(self.state.period_start);
        let target = log_dir(&source).join(self.pattern.historical_name(&date));

        let moved = if target.exists() {
            Self::append_into(&source, &target)
                .and_then(|()| fs::remove_file(&source))
                .map_err(|e| {
                    LoggerError::sink_io(target.display().to_string(), "append into historical file", e)
                })
        } else {
            fs::rename(&source, &target).map_err(|e| {
                LoggerError::sink_io(source.display().to_string(), "rename to historical file", e)
            })
        };

        match moved {
            Ok(()) => {
                self.backups.schedule(
                    BackupJob::new(target.clone(), self.backup_dir(), self.pattern.clone())
                        .with_mode(self.backup_mode)
                        .with_codec(self.codec)
                        .with_retain(self.backup_retention),
                );
                Some(target)
            }
            Err(e) => {
                self.reporter.report(&e);
                None
            }
        }
    }

    fn append_into(source: &Path, target: &Path) -> io::Result<()> {
        let mut input = File::open(source)?;
        let mut output = OpenOptions::new().append(true).open(target)?;
        io::copy(&mut input, &mut output)?;
        output.flush()
    }

    fn prune_history(&self) {
        if self.state.backup_count == 0 {
            return;
        }
        let dir = log_dir(&self.state.current_file);
        let files = match self.pattern.list(&dir) {
            Ok(files) => files,
            Err(e) => {
                self.reporter.report(&LoggerError::sink_io(
                    dir.display().to_string(),
                    "list historical files",
                    e,
                ));
                return;
            }
        };

        for old in history::excess(&files, self.state.backup_count) {
            if let Err(e) = fs::remove_file(old) {
                self.reporter.report(&LoggerError::sink_io(
                    old.display().to_string(),
                    "remove old historical file",
                    e,
                ));
            }
        }
    }

    /// Write one event, rolling over first if a boundary has passed.
    ///
    /// # Errors
    ///
    /// Only [`LoggerError::ClosedSink`]; nothing is written in that case.
    pub fn emit(&mut self, event: &Event, renderer: &dyn RenderCapability) -> Result<()> {
        if self.closed {
            return Err(LoggerError::closed_sink(self.name.clone()));
        }

        let now = self.clock.now();
        if self.policy.is_due(now, &self.state) {
            self.roll(now);
        }

        if self.writer.is_none() && !self.try_reopen() {
            return Ok(());
        }

        let mut text = event.plain(renderer, self.width);
        text.push('\n');

        if let Some(writer) = self.writer.as_mut() {
            let written = writer
                .write_all(text.as_bytes())
                .and_then(|()| writer.flush());
            if let Err(e) = written {
                // drop the handle so the next write reopens the file
                self.writer = None;
                self.reporter.report(&LoggerError::sink_io(
                    self.state.current_file.display().to_string(),
                    "write log record",
                    e,
                ));
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::sink_io(self.state.current_file.display().to_string(), "flush", e)
            })?;
        }
        Ok(())
    }

    /// Flush and release the file. Later emits fail with `ClosedSink`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let flushed = self.flush();
        self.writer = None;
        self.closed = true;
        flushed
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }
    }
}

impl std::fmt::Debug for RotatingFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileSink")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("backup_mode", &self.backup_mode)
            .field("codec", &self.codec)
            .field("closed", &self.closed)
            .finish()
    }
}
