//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
///
/// Loaded once at startup and shared read-only (`Arc<Config>`) afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity.
    pub bot: BotConfig,
    /// Server to connect to and channels to sit in.
    pub server: ServerConfig,
    /// Log file placement and retention.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Nickname (e.g., "goyal").
    pub nick: String,
    /// Login identity sent in USER.
    pub username: String,
    /// Real name sent in USER (defaults to the username).
    #[serde(default)]
    pub realname: Option<String>,
    /// Marker that introduces a bot command in channel text (default: ",").
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl BotConfig {
    /// Real name to announce, falling back to the username.
    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.username)
    }
}

/// Server connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `host:port` of the IRC server.
    pub address: String,
    /// Connect over TLS (default: true).
    #[serde(default = "default_true")]
    pub tls: bool,
    /// Verify the server certificate against the system roots (default: true).
    /// Disable only for self-signed test servers.
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Channels to join, in order.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl ServerConfig {
    /// Host part of `address`, used for TLS server name indication.
    pub fn host(&self) -> &str {
        match self.address.rsplit_once(':') {
            Some((host, _)) => host.trim_start_matches('[').trim_end_matches(']'),
            None => &self.address,
        }
    }
}

/// Log file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Directory holding the per-channel log files (default: "logs").
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Days a log file is kept before the retention sweep removes it (default: 15).
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_command_prefix() -> String {
    ",".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_retention_days() -> u32 {
    15
}
