//! Historical file naming and discovery
//!
//! A sink writing `log/app.txt` archives it as `log/<date>_app.txt`, and the
//! backup manager stores copies as `log/bak/<date>_app.txt` or compressed as
//! `log/bak/<date>_app.gz`. Only names whose date prefix has the exact shape
//! of the configured format are considered, so unrelated files in the same
//! directory are never pruned.

use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPattern {
    file_name: String,
    date_format: String,
    template: String,
}

impl HistoryPattern {
    /// `file_name` is the canonical file name, e.g. `app.txt`
    pub fn new(file_name: impl Into<String>, date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        let template = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.format(&date_format).to_string())
            .unwrap_or_default();

        Self {
            file_name: file_name.into(),
            date_format,
            template,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// File name without its extension (`app` for `app.txt`)
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    /// `<date>_<file_name>`
    pub fn historical_name(&self, date: &str) -> String {
        format!("{}_{}", date, self.file_name)
    }

    /// Whether `prefix` looks like a date produced by this pattern's format
    pub fn is_date_prefix(&self, prefix: &str) -> bool {
        if self.template.is_empty() || prefix.chars().count() != self.template.chars().count() {
            return false;
        }
        prefix
            .chars()
            .zip(self.template.chars())
            .all(|(c, t)| if t.is_ascii_digit() { c.is_ascii_digit() } else { c == t })
    }

    pub fn is_historical(&self, name: &str) -> bool {
        name.strip_suffix(&self.file_name)
            .and_then(|rest| rest.strip_suffix('_'))
            .is_some_and(|prefix| self.is_date_prefix(prefix))
    }

    /// Backup names: `<date>_<stem>.<ext>` where `ext` is the canonical
    /// extension or one of the archive extensions
    pub fn is_backup(&self, name: &str) -> bool {
        let Some((rest, ext)) = name.rsplit_once('.') else {
            return false;
        };
        let own_ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if ext != own_ext && ext != "gz" && ext != "bz2" {
            return false;
        }

        rest.strip_suffix(self.stem())
            .and_then(|r| r.strip_suffix('_'))
            .is_some_and(|prefix| self.is_date_prefix(prefix))
    }

    /// Historical files in `dir`, oldest first
    pub fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        list_matching(dir, |name| self.is_historical(name))
    }

    /// Backups in `dir` (usually `<log dir>/bak`), oldest first
    pub fn list_backups(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        list_matching(dir, |name| self.is_backup(name))
    }
}

fn list_matching(dir: &Path, matches: impl Fn(&str) -> bool) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if matches(name) {
                found.push(entry.path());
            }
        }
    }
    // date prefixes sort chronologically as strings
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(found)
}

/// The oldest entries of a sorted list beyond the newest `keep`.
/// `keep == 0` means keep everything.
pub fn excess(sorted: &[PathBuf], keep: usize) -> &[PathBuf] {
    if keep == 0 || sorted.len() <= keep {
        return &[];
    }
    &sorted[..sorted.len() - keep]
}
