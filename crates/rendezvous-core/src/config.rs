//! Configuration for the rendezvous master and its channels.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $RENDEZVOUS_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/rendezvous/config.toml
//!   3. ~/.config/rendezvous/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::wire::DEFAULT_MAX_MESSAGE_BYTES;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendezvousConfig {
    pub master: MasterConfig,
    pub channel: ChannelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Address the HTTP API listens on.
    pub bind_ip: String,
    pub api_port: u16,
    /// Delay between heart-beat read retries.
    pub heart_beat_secs: u64,
    /// Consecutive failed heart beats before a client is dropped.
    pub heart_beat_trials: u32,
    /// Period of the registry snapshot log line. 0 = disabled.
    pub snapshot_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub max_message_bytes: usize,
    /// Publisher outbox capacity.
    pub queue_size: usize,
    pub multicast_trials: u32,
    pub port_trials: u32,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            bind_ip: "0.0.0.0".to_string(),
            api_port: 8600,
            heart_beat_secs: 1,
            heart_beat_trials: 3,
            snapshot_secs: 10,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            queue_size: 10,
            multicast_trials: 1000,
            port_trials: 100,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("rendezvous")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RendezvousConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path())
    }

    /// Load from an explicit path, falling back to defaults if it does not exist.
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            RendezvousConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn file_path() -> PathBuf {
        std::env::var("RENDEZVOUS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&RendezvousConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply `RENDEZVOUS_<SECTION>__<KEY>` overrides. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("RENDEZVOUS_MASTER__BIND_IP") {
            self.master.bind_ip = v;
        }
        override_parsed(&lookup, "RENDEZVOUS_MASTER__API_PORT", &mut self.master.api_port);
        override_parsed(
            &lookup,
            "RENDEZVOUS_MASTER__HEART_BEAT_SECS",
            &mut self.master.heart_beat_secs,
        );
        override_parsed(
            &lookup,
            "RENDEZVOUS_MASTER__HEART_BEAT_TRIALS",
            &mut self.master.heart_beat_trials,
        );
        override_parsed(
            &lookup,
            "RENDEZVOUS_MASTER__SNAPSHOT_SECS",
            &mut self.master.snapshot_secs,
        );
        override_parsed(
            &lookup,
            "RENDEZVOUS_CHANNEL__MAX_MESSAGE_BYTES",
            &mut self.channel.max_message_bytes,
        );
        override_parsed(
            &lookup,
            "RENDEZVOUS_CHANNEL__QUEUE_SIZE",
            &mut self.channel.queue_size,
        );
        override_parsed(
            &lookup,
            "RENDEZVOUS_CHANNEL__MULTICAST_TRIALS",
            &mut self.channel.multicast_trials,
        );
        override_parsed(
            &lookup,
            "RENDEZVOUS_CHANNEL__PORT_TRIALS",
            &mut self.channel.port_trials,
        );
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    if let Some(v) = lookup(key).and_then(|v| v.parse().ok()) {
        *slot = v;
    }
}
