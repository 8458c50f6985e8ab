//! Unified error handling for slirc-logbot.
//!
//! Errors are split by the layer that raises them. Everything that can end the
//! process funnels into [`BotError`], which `main` turns into a non-zero exit.

use std::path::PathBuf;
use thiserror::Error;

use crate::irc::Message;

// ============================================================================
// Log Errors (per-channel log files)
// ============================================================================

/// Failures raised by the log session.
///
/// All of these are fatal at runtime: a logbot that can no longer write its
/// logs has nothing useful left to do.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log session is closed")]
    Closed,
}

// ============================================================================
// Outbound Errors
// ============================================================================

/// The outbound queue is gone (connection loop has exited).
#[derive(Debug, Error)]
#[error("outbound queue closed")]
pub struct SendError;

impl From<tokio::sync::mpsc::error::SendError<Message>> for SendError {
    fn from(_: tokio::sync::mpsc::error::SendError<Message>) -> Self {
        SendError
    }
}

// ============================================================================
// Top-level Errors
// ============================================================================

/// Errors that terminate the bot.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {host} failed: {reason}")]
    Tls { host: String, reason: String },

    #[error("protocol error: {0}")]
    Protocol(#[from] crate::irc::ProtocolError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Send(#[from] SendError),
}

impl BotError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect_failed",
            Self::Tls { .. } => "tls_failed",
            Self::Protocol(_) => "protocol_error",
            Self::Log(_) => "log_failed",
            Self::Send(_) => "send_failed",
        }
    }
}
