//! slirc-logbot - Straylight channel logbot.
//!
//! Sits in a set of IRC channels, writes one log file per channel per day,
//! greets people and relays `,tell` messages to users who were away.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod irc;
pub mod log;
pub mod mailbox;
pub mod router;
pub mod state;

pub use config::Config;
pub use error::BotError;
pub use state::BotState;
