//! YAML configuration for the monitor binary.
//!
//! Every field has a default except the server ids, which are validated
//! after parsing together with the other cross-field constraints.

use serde::{de, Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Example configuration printed by `monitor --example`.
pub const EXAMPLE_CONFIG: &str = include_str!("../example.config.yaml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("bot token is empty but the discord sink is selected")]
    MissingToken,
    #[error("no servers configured")]
    NoServers,
    #[error("server #{0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate server id `{0}`")]
    DuplicateId(String),
    #[error("bot.{0} must be at least 1")]
    Zero(&'static str),
    #[error("bot.update_interval must be longer than zero")]
    ZeroInterval,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bot: BotConfig,
    pub servers: Vec<ServerConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Discord bot token, only needed by the discord sink
    pub token: String,
    #[serde(deserialize_with = "deserialize_duration")]
    pub update_interval: Duration,
    /// Parallel queries per cycle, also the number of update workers
    pub concurrency: usize,
    pub queue_capacity: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub apply_timeout: Duration,
    pub sink: SinkKind,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            update_interval: Duration::from_secs(30),
            concurrency: 10,
            queue_capacity: crate::queue::DEFAULT_QUEUE_CAPACITY,
            apply_timeout: Duration::from_secs(30),
            sink: SinkKind::Log,
        }
    }
}

/// Where presentation updates go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Log every update instead of sending it
    #[default]
    Log,
    Discord,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub buffer_size: u16,
    /// Query timeout, plain numbers are seconds
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub channel_description: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub category_description: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            host: "127.0.0.1".to_string(),
            port: 27016,
            buffer_size: 1400,
            timeout: Duration::from_secs(3),
            channel_id: None,
            channel_name: None,
            channel_description: None,
            category_id: None,
            category_name: None,
            category_description: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// env_logger filter, `RUST_LOG` takes precedence
    pub level: String,
    pub output: LogOutput,
    pub color: LogColor,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            color: LogColor::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogColor {
    #[default]
    Auto,
    Always,
    Never,
}

impl Config {
    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parses YAML text, resolving `<<` merge keys before mapping it onto
    /// [`Config`].
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let mut value: serde_yaml::Value = serde_yaml::from_str(text)?;
        value.apply_merge()?;
        let config: Config = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.sink == SinkKind::Discord && self.bot.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.bot.concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }
        if self.bot.queue_capacity == 0 {
            return Err(ConfigError::Zero("queue_capacity"));
        }
        if self.bot.update_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }

        let mut seen = HashSet::new();
        for (index, server) in self.servers.iter().enumerate() {
            if server.id.trim().is_empty() {
                return Err(ConfigError::EmptyId(index));
            }
            if !seen.insert(server.id.as_str()) {
                return Err(ConfigError::DuplicateId(server.id.clone()));
            }
        }

        Ok(())
    }
}

/// Accepts integer or fractional seconds, or strings such as `500ms`, `30s`,
/// `5m`, `1h` and combinations like `1m30s`.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Fractional(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Fractional(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|_| de::Error::custom(format!("invalid duration {}", secs))),
        Raw::Text(text) => parse_duration(&text).map_err(de::Error::custom),
    }
}

pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration `{}`", text))?;
        if digits == 0 {
            return Err(format!("invalid duration `{}`", text));
        }
        let value: f64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid number in duration `{}`", text))?;

        let unit_len = rest[digits..]
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len() - digits);
        let unit = &rest[digits..digits + unit_len];
        let scale = match unit {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(format!("unknown unit `{}` in duration `{}`", unit, text)),
        };

        total = Duration::try_from_secs_f64(value * scale)
            .ok()
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("duration `{}` is out of range", text))?;
        rest = &rest[digits + unit_len..];
    }

    Ok(total)
}
