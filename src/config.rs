// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base poll cadence, independent of the 204/429 backoff.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Delay before repeating a request answered with 204 or 429.
pub const DEFAULT_BACKOFF_MS: u64 = 2000;

/// Authors whose username contains this (any case) are treated as other bots.
/// Crude on purpose: usernames are the only signal the poll loop looks at.
pub const DEFAULT_BOT_NAME_MARKER: &str = "bot";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// API host, also used for SNI and certificate name checks
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix in front of every API route
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Name of the channel to echo in
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Scheme of the Authorization header ("Bearer", or "Bot" for bot tokens)
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_bot_name_marker")]
    pub bot_name_marker: String,

    /// Consecutive soft session failures tolerated before giving up
    #[serde(default = "default_max_soft_restarts")]
    pub max_soft_restarts: u32,

    /// Fatal session failures tolerated over the process lifetime
    #[serde(default = "default_max_fatal_failures")]
    pub max_fatal_failures: u32,

    /// Print every echoed message to stdout
    #[serde(default)]
    pub verbose: bool,
}

fn default_host() -> String {
    "discord.com".to_string()
}

fn default_port() -> u16 {
    443
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_channel() -> String {
    "isa-bot".to_string()
}

fn default_auth_scheme() -> String {
    "Bearer".to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF_MS
}

fn default_bot_name_marker() -> String {
    DEFAULT_BOT_NAME_MARKER.to_string()
}

fn default_max_soft_restarts() -> u32 {
    5
}

fn default_max_fatal_failures() -> u32 {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
            channel: default_channel(),
            auth_scheme: default_auth_scheme(),
            poll_interval_ms: default_poll_interval_ms(),
            backoff_ms: default_backoff_ms(),
            bot_name_marker: default_bot_name_marker(),
            max_soft_restarts: default_max_soft_restarts(),
            max_fatal_failures: default_max_fatal_failures(),
            verbose: false,
        }
    }
}

impl AgentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Full route for an API path such as `/users/@me`.
    pub fn route(&self, path: &str) -> String {
        format!("{}{path}", self.api_prefix.trim_end_matches('/'))
    }
}

/// Opaque bot token. Never printed.
#[derive(Clone)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Value of the Authorization header for the given scheme.
    pub fn authorization(&self, scheme: &str) -> String {
        format!("{scheme} {}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("isabot.toml")
}

pub fn load_config(path: &Path) -> Result<Option<AgentConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let config: AgentConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    Ok(Some(config))
}

pub fn save_config(path: &Path, config: &AgentConfig) -> Result<()> {
    let toml = toml::to_string_pretty(config)?;
    std::fs::write(path, toml)?;
    Ok(())
}
