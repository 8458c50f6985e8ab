//! Retention sweep for old log files.
//!
//! Runs after every rotation. There is no index: the log directory is
//! rescanned and each file's age is read back from its name.
//!
//! Age is counted in whole calendar days (`today - file_date`). A file is
//! removed only when its age is strictly greater than the retention window,
//! so with the default 15 days a file dated 15 days ago survives and one
//! dated 16 days ago is removed.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::format::{TIME_FILE_FORMAT, sanitize_channel};

/// Outcome of one sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Files that were deleted.
    pub removed: Vec<PathBuf>,
    /// Files that matched but could not be deleted.
    pub failed: usize,
}

/// Deletes channel logs older than the retention window.
#[derive(Debug, Clone, Copy)]
pub struct RetentionSweeper {
    retention_days: u32,
}

impl RetentionSweeper {
    pub fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }

    /// Sweep `dir` for logs of `channels` that have aged out as of `now`.
    ///
    /// Only `<channel>-<YYYY-MM-DD>.txt` files of the given channels are
    /// considered; everything else in the directory is left alone. A failed
    /// deletion is reported and the sweep carries on with the next file.
    pub fn sweep<S: AsRef<str>>(
        &self,
        dir: &Path,
        now: DateTime<Utc>,
        channels: &[S],
    ) -> SweepReport {
        self.sweep_with(dir, now, channels, |path| std::fs::remove_file(path))
    }

    fn sweep_with<S: AsRef<str>>(
        &self,
        dir: &Path,
        now: DateTime<Utc>,
        channels: &[S],
        mut remove: impl FnMut(&Path) -> std::io::Result<()>,
    ) -> SweepReport {
        let mut report = SweepReport::default();

        let Some(pattern) = log_file_pattern(channels) else {
            return report;
        };

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to scan log directory");
                return report;
            }
        };

        let today = now.date_naive();

        for entry in entries.flatten() {
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if !is_file {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(caps) = pattern.captures(name) else {
                continue;
            };
            let Ok(day) = NaiveDate::parse_from_str(&caps[1], TIME_FILE_FORMAT) else {
                debug!(file = %name, "Skipping log file with invalid date");
                continue;
            };

            if !self.is_expired(day, today) {
                continue;
            }

            let path = entry.path();
            info!(path = %path.display(), "Deleting log file");
            match remove(&path) {
                Ok(()) => report.removed.push(path),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete log file");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Whether a log dated `day` is past retention on `today`.
    pub fn is_expired(&self, day: NaiveDate, today: NaiveDate) -> bool {
        today.signed_duration_since(day).num_days() > i64::from(self.retention_days)
    }
}

/// `^(?:stem|stem)-(YYYY-MM-DD)\.txt$` for the sanitized channel names.
fn log_file_pattern<S: AsRef<str>>(channels: &[S]) -> Option<Regex> {
    if channels.is_empty() {
        return None;
    }

    let alternatives = channels
        .iter()
        .map(|c| regex::escape(&sanitize_channel(c.as_ref())))
        .collect::<Vec<_>>()
        .join("|");
    let source = format!(r"^(?:{})-(\d{{4}}-\d{{2}}-\d{{2}})\.txt$", alternatives);

    match Regex::new(&source) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %source, error = %e, "Failed to build log file pattern");
            None
        }
    }
}
