//! Timestamps, line framing and log file naming.

use chrono::{DateTime, NaiveDate, Utc};

/// Timestamp prefix of each log line, e.g. `Oct 9 2026 14:03:05`.
pub const TIME_MESSAGE_FORMAT: &str = "%b %-d %Y %H:%M:%S";

/// Date component of a log file name, e.g. `2026-10-09`.
pub const TIME_FILE_FORMAT: &str = "%Y-%m-%d";

/// Suffix of the per-channel link that always points at today's file.
pub const LATEST_LINK_SUFFIX: &str = "log";

/// Render `now` the way log lines and mailbox entries show it.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format(TIME_MESSAGE_FORMAT).to_string()
}

/// Frame one log line: `<timestamp> body\n`.
///
/// The body is written as-is; callers must strip line breaks beforehand.
pub fn format_line(now: DateTime<Utc>, body: &str) -> String {
    format!("<{}> {}\n", timestamp(now), body)
}

/// Reduce a channel name to a string that is safe to use in a file name.
///
/// Leading channel-type characters are dropped, ASCII is folded to lowercase
/// (channel names are case-insensitive) and anything a filesystem could
/// misread is replaced with `_`.
pub fn sanitize_channel(channel: &str) -> String {
    let stem: String = channel
        .trim_start_matches(['#', '&', '+', '!'])
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    if stem.is_empty() || stem == "." || stem == ".." {
        "_".to_string()
    } else {
        stem
    }
}

/// File name of a channel's log for `day`: `<stem>-<YYYY-MM-DD>.txt`.
pub fn file_name(stem: &str, day: NaiveDate) -> String {
    format!("{}-{}.txt", stem, day.format(TIME_FILE_FORMAT))
}

/// File name of a channel's "latest" link: `<stem>-log.txt`.
pub fn link_name(stem: &str) -> String {
    format!("{}-{}.txt", stem, LATEST_LINK_SUFFIX)
}

/// Replace CR and LF so a body can never break line framing.
pub fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
