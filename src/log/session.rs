//! Per-channel log session.
//!
//! Holds at most one open file per channel. The whole lookup, rotate and
//! write sequence for a line runs under a single lock, so a writer can never
//! hold a handle that a concurrent rotation has already closed.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::format::{file_name, format_line, link_name, sanitize_channel};
use super::retention::RetentionSweeper;
use crate::error::LogError;

/// The open log file for one channel and the day it belongs to.
struct LogEntry {
    day: NaiveDate,
    path: PathBuf,
    file: File,
}

impl LogEntry {
    fn open(dir: &Path, stem: &str, day: NaiveDate) -> Result<Self, LogError> {
        let path = dir.join(file_name(stem, day));

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(&path).map_err(|source| LogError::Open {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Opened log file");

        Ok(Self { day, path, file })
    }

    fn write(&mut self, line: &str) -> Result<(), LogError> {
        self.file
            .write_all(line.as_bytes())
            .map_err(|source| LogError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn close(mut self) {
        if let Err(e) = self.file.flush() {
            warn!(path = %self.path.display(), error = %e, "Failed to flush log file");
        }
        debug!(path = %self.path.display(), "Closed log file");
    }
}

#[derive(Default)]
struct SessionState {
    entries: HashMap<String, LogEntry>,
    closed: bool,
}

/// Owner of every open channel log file.
pub struct LogSession {
    dir: PathBuf,
    /// Sanitized names of the configured channels, swept on every rotation.
    channels: Vec<String>,
    sweeper: RetentionSweeper,
    state: Mutex<SessionState>,
}

impl LogSession {
    /// Create a session writing into `dir`, creating the directory if needed.
    pub fn new<S: AsRef<str>>(
        dir: impl Into<PathBuf>,
        channels: &[S],
        sweeper: RetentionSweeper,
    ) -> Result<Self, LogError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| LogError::Open {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            channels: channels
                .iter()
                .map(|c| sanitize_channel(c.as_ref()))
                .collect(),
            sweeper,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Append `body` to today's log for `channel`.
    ///
    /// The clock is read under the session lock, so lines land in the order
    /// of their timestamps.
    pub fn append(&self, channel: &str, body: &str) -> Result<(), LogError> {
        self.write_line(channel, body, Utc::now)
    }

    /// Append `body` to the log for `channel` as of `now`.
    ///
    /// Opens the channel's file on first use and rotates it when `now` falls
    /// on a later UTC day than the open file. A line stamped earlier than
    /// the open file's day goes into the open file. Every rotation is
    /// followed by a retention sweep of the log directory.
    pub fn append_at(&self, channel: &str, body: &str, now: DateTime<Utc>) -> Result<(), LogError> {
        self.write_line(channel, body, || now)
    }

    fn write_line(
        &self,
        channel: &str,
        body: &str,
        clock: impl FnOnce() -> DateTime<Utc>,
    ) -> Result<(), LogError> {
        let stem = sanitize_channel(channel);

        let swept = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(LogError::Closed);
            }
            let now = clock();
            let day = now.date_naive();

            let mut rotated = false;
            let mut entry = match state.entries.remove(&stem) {
                Some(entry) if entry.day >= day => entry,
                stale => {
                    if let Some(old) = stale {
                        info!(channel = %channel, from = %old.day, to = %day, "Rotating log file");
                        old.close();
                    }
                    rotated = true;
                    LogEntry::open(&self.dir, &stem, day)?
                }
            };

            if rotated {
                self.update_link(&stem, &entry.path);
            }

            let written = entry.write(&format_line(now, body));
            state.entries.insert(stem, entry);
            written?;

            // Sweep outside the lock; writers may keep appending meanwhile.
            rotated.then(|| (now, self.known_channels(&state)))
        };

        if let Some((now, channels)) = swept {
            let report = self.sweeper.sweep(&self.dir, now, channels.as_slice());
            if !report.removed.is_empty() || report.failed > 0 {
                info!(
                    removed = report.removed.len(),
                    failed = report.failed,
                    "Log retention sweep finished"
                );
            }
        }

        Ok(())
    }

    /// Release every open handle. Safe to call more than once; only the first
    /// call does anything, and later appends fail with [`LogError::Closed`].
    pub fn close_all(&self) -> usize {
        let mut state = self.state.lock();
        if state.closed {
            return 0;
        }
        state.closed = true;

        let count = state.entries.len();
        for (_, entry) in state.entries.drain() {
            entry.close();
        }
        info!(count, "Closed all log files");
        count
    }

    /// Number of channels with an open file.
    pub fn open_files(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Path of the file currently open for `channel`, if any.
    pub fn current_path(&self, channel: &str) -> Option<PathBuf> {
        let stem = sanitize_channel(channel);
        self.state.lock().entries.get(&stem).map(|e| e.path.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Configured channels plus any other channel that currently has a file.
    fn known_channels(&self, state: &SessionState) -> Vec<String> {
        let mut channels = self.channels.clone();
        for stem in state.entries.keys() {
            if !channels.contains(stem) {
                channels.push(stem.clone());
            }
        }
        channels
    }

    /// Point `<stem>-log.txt` at today's file.
    #[cfg(unix)]
    fn update_link(&self, stem: &str, target: &Path) {
        let link = self.dir.join(link_name(stem));
        let Some(target_name) = target.file_name() else {
            return;
        };

        if let Err(e) = std::fs::remove_file(&link)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(link = %link.display(), error = %e, "Failed to remove stale log link");
            return;
        }
        if let Err(e) = std::os::unix::fs::symlink(target_name, &link) {
            warn!(link = %link.display(), error = %e, "Failed to link current log file");
        }
    }

    #[cfg(not(unix))]
    fn update_link(&self, _stem: &str, _target: &Path) {}
}

/// Closes a [`LogSession`] when dropped.
///
/// Held by `main` for the life of the process so every log file is released
/// on a normal return, an error return or while unwinding from a panic.
pub struct SessionGuard {
    session: Arc<LogSession>,
}

impl SessionGuard {
    pub fn new(session: Arc<LogSession>) -> Self {
        Self { session }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close_all();
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        self.close_all();
    }
}
