//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.nick is required")]
    MissingNick,
    #[error("bot.nick must not contain spaces, got '{0}'")]
    InvalidNick(String),
    #[error("bot.username is required")]
    MissingUsername,
    #[error("bot.command_prefix must not be empty")]
    EmptyCommandPrefix,
    #[error("server.address must be host:port, got '{0}'")]
    InvalidAddress(String),
    #[error("server.channels must list at least one channel")]
    NoChannels,
    #[error("channel name must start with '#', '&', '+' or '!', got '{0}'")]
    InvalidChannel(String),
    #[error("log.retention_days must be at least 1")]
    ZeroRetention,
    #[error("log.dir parent directory does not exist: {0}")]
    LogDirInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Identity
    let nick = &config.bot.nick;
    if nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if nick.chars().any(|c| c.is_whitespace() || c == ',') {
        errors.push(ValidationError::InvalidNick(nick.clone()));
    }
    if config.bot.username.is_empty() {
        errors.push(ValidationError::MissingUsername);
    }
    if config.bot.command_prefix.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandPrefix);
    }

    // Server
    let address = &config.server.address;
    let port_ok = address
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if !port_ok {
        errors.push(ValidationError::InvalidAddress(address.clone()));
    }

    if config.server.channels.is_empty() {
        errors.push(ValidationError::NoChannels);
    }
    for channel in &config.server.channels {
        let valid = channel.len() > 1
            && channel.starts_with(['#', '&', '+', '!'])
            && !channel.contains([' ', ',', '\x07']);
        if !valid {
            errors.push(ValidationError::InvalidChannel(channel.clone()));
        }
    }

    // Logging
    if config.log.retention_days == 0 {
        errors.push(ValidationError::ZeroRetention);
    }
    if let Some(parent) = config.log.dir.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::LogDirInvalid(
            config.log.dir.display().to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
