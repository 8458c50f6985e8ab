//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, BotConfig, ServerConfig, LogConfig)
//! - [`validation`]: Startup validation of a loaded config

mod types;
mod validation;

pub use types::{BotConfig, Config, ConfigError, LogConfig, ServerConfig};
pub use validation::{ValidationError, validate};
