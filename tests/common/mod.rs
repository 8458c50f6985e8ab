//! Integration test common infrastructure.
//!
//! The bot is a client, so the harness plays the IRC server: it accepts the
//! bot's connection, feeds it raw lines and asserts on what comes back.

pub mod server;

#[allow(unused_imports)]
pub use server::{BotHandle, FakeServer};
