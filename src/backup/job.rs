//! A single backup of one historical log file

use crate::core::error::{LoggerError, Result};
use crate::rotation::history::{self, HistoryPattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const BUFFER_SIZE: usize = 64 * 1024;

/// What happens to a file once it has been rolled over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    /// No backup
    #[default]
    #[serde(alias = "delete")]
    None,
    /// Byte-for-byte copy into the backup directory
    Copy,
    /// Compressed copy into the backup directory
    #[serde(alias = "zip")]
    Archive,
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackupMode::None => "none",
            BackupMode::Copy => "copy",
            BackupMode::Archive => "archive",
        };
        f.pad(name)
    }
}

impl FromStr for BackupMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "delete" => Ok(BackupMode::None),
            "copy" => Ok(BackupMode::Copy),
            "archive" | "zip" => Ok(BackupMode::Archive),
            _ => Err(LoggerError::config(
                "LogBackUpMethod",
                format!("unknown backup method '{}', expected none, copy or archive", s),
            )),
        }
    }
}

/// Compression used by [`BackupMode::Archive`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCodec {
    #[default]
    #[serde(alias = "gz")]
    Gzip,
    #[serde(alias = "bzip2")]
    Bz2,
}

impl ArchiveCodec {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveCodec::Gzip => "gz",
            ArchiveCodec::Bz2 => "bz2",
        }
    }
}

impl fmt::Display for ArchiveCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveCodec::Gzip => "gzip",
            ArchiveCodec::Bz2 => "bz2",
        };
        f.pad(name)
    }
}

impl FromStr for ArchiveCodec {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gzip" | "gz" => Ok(ArchiveCodec::Gzip),
            "bz2" | "bzip2" => Ok(ArchiveCodec::Bz2),
            _ => Err(LoggerError::config(
                "ZipMethod",
                format!("unknown compression '{}', expected gzip or bz2", s),
            )),
        }
    }
}

/// Which file a job backs up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupSource {
    Path(PathBuf),
    /// The newest historical file in `log_dir` other than `exclude`: the
    /// last file a previous run rotated, which a crash may have left
    /// without a backup
    Recover {
        log_dir: PathBuf,
        exclude: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Skipped,
    Copied(PathBuf),
    Archived(PathBuf),
}

/// One unit of backup work
///
/// # Examples
///
/// ```
/// use rust_rotating_logger::backup::{ArchiveCodec, BackupJob, BackupMode, BackupOutcome};
/// use rust_rotating_logger::rotation::HistoryPattern;
///
/// let dir = tempfile::tempdir().unwrap();
/// let file = dir.path().join("2024-05-01_app.txt");
/// std::fs::write(&file, "hello\n").unwrap();
///
/// let job = BackupJob::new(
///     file,
///     dir.path().join("bak"),
///     HistoryPattern::new("app.txt", "%Y-%m-%d"),
/// )
/// .with_mode(BackupMode::Archive)
/// .with_codec(ArchiveCodec::Gzip);
///
/// let outcome = job.run().unwrap();
/// assert_eq!(outcome, BackupOutcome::Archived(dir.path().join("bak/2024-05-01_app.gz")));
/// // the archive already exists, so a second run does nothing
/// assert_eq!(job.run().unwrap(), BackupOutcome::Skipped);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJob {
    pub source: BackupSource,
    pub backup_dir: PathBuf,
    pub mode: BackupMode,
    pub codec: ArchiveCodec,
    pub pattern: HistoryPattern,
    /// Number of backups to keep for this pattern, `None` keeps all
    pub retain: Option<usize>,
}

impl BackupJob {
    pub fn new(source: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>, pattern: HistoryPattern) -> Self {
        Self {
            source: BackupSource::Path(source.into()),
            backup_dir: backup_dir.into(),
            mode: BackupMode::Copy,
            codec: ArchiveCodec::Gzip,
            pattern,
            retain: None,
        }
    }

    /// Job backing up the file a previous run left behind
    pub fn recover(log_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>, pattern: HistoryPattern) -> Self {
        Self {
            source: BackupSource::Recover {
                log_dir: log_dir.into(),
                exclude: None,
            },
            ..Self::new(PathBuf::new(), backup_dir, pattern)
        }
    }

    /// Leave `path` out when resolving a recover source, e.g. a file that
    /// already has its own job
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn excluding(mut self, path: impl Into<PathBuf>) -> Self {
        if let BackupSource::Recover { exclude, .. } = &mut self.source {
            *exclude = Some(path.into());
        }
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_mode(mut self, mode: BackupMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_codec(mut self, codec: ArchiveCodec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_retain(mut self, retain: Option<usize>) -> Self {
        self.retain = retain;
        self
    }

    /// The concrete file this job would back up, `None` when there is nothing
    pub fn resolve_source(&self) -> Result<Option<PathBuf>> {
        match &self.source {
            BackupSource::Path(path) => Ok(Some(path.clone())),
            BackupSource::Recover { log_dir, exclude } => {
                let files = self.pattern.list(log_dir).map_err(|e| {
                    LoggerError::backup_io(
                        log_dir.display().to_string(),
                        "cannot list historical files",
                        e,
                    )
                })?;
                Ok(files
                    .into_iter()
                    .rev()
                    .find(|file| exclude.as_ref() != Some(file)))
            }
        }
    }

    pub fn run(&self) -> Result<BackupOutcome> {
        if self.mode == BackupMode::None {
            return Ok(BackupOutcome::Skipped);
        }
        match self.resolve_source()? {
            Some(source) => self.run_on(&source),
            None => Ok(BackupOutcome::Skipped),
        }
    }

    /// Back up `source`, then apply the retention count
    pub fn run_on(&self, source: &Path) -> Result<BackupOutcome> {
        let outcome = match self.mode {
            BackupMode::None => return Ok(BackupOutcome::Skipped),
            BackupMode::Copy => self.copy(source)?,
            BackupMode::Archive => self.archive(source)?,
        };

        if let Some(keep) = self.retain {
            self.prune(keep)?;
        }
        Ok(outcome)
    }

    fn prepare(&self, source: &Path) -> Result<String> {
        if !source.is_file() {
            return Err(LoggerError::backup(
                source.display().to_string(),
                "source file does not exist",
            ));
        }
        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            LoggerError::backup_io(
                self.backup_dir.display().to_string(),
                "cannot create backup directory",
                e,
            )
        })?;
        source
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| LoggerError::backup(source.display().to_string(), "invalid file name"))
    }

    fn copy(&self, source: &Path) -> Result<BackupOutcome> {
        let name = self.prepare(source)?;
        let target = self.backup_dir.join(name);
        fs::copy(source, &target).map_err(|e| {
            LoggerError::backup_io(source.display().to_string(), "copy failed", e)
        })?;
        Ok(BackupOutcome::Copied(target))
    }

    fn archive(&self, source: &Path) -> Result<BackupOutcome> {
        let name = self.prepare(source)?;
        let stem = Path::new(&name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&name);
        let target = self
            .backup_dir
            .join(format!("{}.{}", stem, self.codec.extension()));
        if target.exists() {
            return Ok(BackupOutcome::Skipped);
        }

        // Write the archive next to its target first; a partial archive must
        // never carry the final name
        let temp = self
            .backup_dir
            .join(format!("{}.{}.tmp", stem, self.codec.extension()));

        if let Err(e) = self.encode(source, &temp) {
            let _ = fs::remove_file(&temp);
            return Err(LoggerError::backup_io(
                source.display().to_string(),
                format!("{} compression failed", self.codec),
                e,
            ));
        }

        fs::rename(&temp, &target).map_err(|e| {
            let _ = fs::remove_file(&temp);
            LoggerError::backup_io(
                target.display().to_string(),
                "cannot move archive into place",
                e,
            )
        })?;

        Ok(BackupOutcome::Archived(target))
    }

    fn encode(&self, source: &Path, temp: &Path) -> io::Result<()> {
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, File::open(source)?);
        let output = BufWriter::with_capacity(BUFFER_SIZE, File::create(temp)?);

        let mut output = match self.codec {
            ArchiveCodec::Gzip => {
                let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
                io::copy(&mut reader, &mut encoder)?;
                encoder.finish()?
            }
            ArchiveCodec::Bz2 => {
                let mut encoder = bzip2::write::BzEncoder::new(output, bzip2::Compression::default());
                io::copy(&mut reader, &mut encoder)?;
                encoder.finish()?
            }
        };
        output.flush()?;
        output.get_ref().sync_all()
    }

    fn prune(&self, keep: usize) -> Result<()> {
        let backups = self.pattern.list_backups(&self.backup_dir).map_err(|e| {
            LoggerError::backup_io(
                self.backup_dir.display().to_string(),
                "cannot list backups",
                e,
            )
        })?;

        for old in history::excess(&backups, keep) {
            fs::remove_file(old).map_err(|e| {
                LoggerError::backup_io(old.display().to_string(), "cannot remove old backup", e)
            })?;
        }
        Ok(())
    }
}
