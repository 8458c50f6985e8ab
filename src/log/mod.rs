//! Per-channel daily log files.
//!
//! - [`session`]: one open, rotating file per channel
//! - [`retention`]: removal of log files older than the retention window
//! - [`format`]: timestamps, line framing and file naming

pub mod format;
pub mod retention;
pub mod session;

pub use retention::{RetentionSweeper, SweepReport};
pub use session::{LogSession, SessionGuard};
