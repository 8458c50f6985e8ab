//! CTCP (Client-to-Client Protocol) helpers.
//!
//! CTCP requests ride inside PRIVMSG text wrapped in `\x01`, e.g.
//! `\x01ACTION waves\x01` for `/me waves`.

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// A parsed CTCP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// Command name as sent (e.g. `ACTION`, `VERSION`).
    pub command: &'a str,
    /// Everything after the command, if present.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse `text` as a CTCP message. The closing delimiter is optional,
    /// as some clients omit it.
    pub fn parse(text: &'a str) -> Option<Self> {
        let inner = text.strip_prefix(CTCP_DELIM)?;
        let inner = inner.strip_suffix(CTCP_DELIM).unwrap_or(inner);
        if inner.is_empty() {
            return None;
        }

        let (command, params) = match inner.split_once(' ') {
            Some((command, params)) => (command, Some(params)),
            None => (inner, None),
        };
        Some(Self { command, params })
    }

    pub fn is(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params {
            Some(params) => write!(f, "{0}{1} {2}{0}", CTCP_DELIM, self.command, params),
            None => write!(f, "{0}{1}{0}", CTCP_DELIM, self.command),
        }
    }
}

/// Text of a `/me` action, if `text` is one.
pub fn action(text: &str) -> Option<&str> {
    Ctcp::parse(text)
        .filter(|c| c.is("ACTION"))
        .map(|c| c.params.unwrap_or(""))
}
