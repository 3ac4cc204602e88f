//! Configuration file for the publisher.
//!
//! Configuration is stored in ~/.mqforward/config.yaml. The file is optional
//! at the default location and required when a path is given explicitly.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use mqforward_mqtt::DEFAULT_PORT;
use mqforward_payload::TOPIC;

use crate::publisher::FlushMode;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".mqforward";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Publisher configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging.
    #[serde(default)]
    pub debug: bool,

    /// Broker connection settings.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Publish behaviour.
    #[serde(default)]
    pub publish: PublishConfig,

    /// Path the config was read from (not serialized).
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

/// Broker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub hostname: String,
    /// 0 means the default port.
    pub port: u16,
    pub topic: String,
    pub qos: u8,
    /// Empty means a random `mqforward-` id.
    pub client_id: String,
    /// Keep-alive in seconds.
    pub keep_alive: u16,
    /// Connect timeout in seconds.
    pub connect_timeout: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: DEFAULT_PORT,
            topic: TOPIC.to_string(),
            qos: 0,
            client_id: String::new(),
            keep_alive: 20,
            connect_timeout: 10,
        }
    }
}

/// Publish behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub flush: FlushMode,
    /// Delay before exit in `sleep` mode, in milliseconds.
    pub delay_ms: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            flush: FlushMode::Ack,
            delay_ms: 50,
        }
    }
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the path the config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.mqtt.hostname.is_empty() {
            anyhow::bail!("mqtt.hostname must not be empty");
        }
        if self.mqtt.topic.is_empty() {
            anyhow::bail!("mqtt.topic must not be empty");
        }
        if self.mqtt.qos > 2 {
            anyhow::bail!("mqtt.qos must be 0, 1 or 2, got {}", self.mqtt.qos);
        }
        Ok(())
    }
}

/// Loads the configuration from `custom_path`, or the default location.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    match custom_path {
        Some(p) => {
            let path = expand_home(p);
            read_config(&path)
        }
        None => match Config::default_config_path() {
            Some(path) if path.exists() => read_config(&path),
            _ => Ok(Config::default()),
        },
    }
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;

    let mut cfg: Config = if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("parse config {}", path.display()))?
    };

    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    cfg.config_path = Some(path.to_path_buf());
    Ok(cfg)
}

/// Replaces a leading `~` with the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    PathBuf::from(path)
}
