//! Configuration system for Sluice.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SLUICE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/sluice/config.toml
//!   3. ~/.config/sluice/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SluiceConfig {
    pub transport: TransportConfig,
    pub fdset: FdsetConfig,
    pub slowlog: SlowLogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Largest chunk moved per backend call. 0 = unbounded.
    pub max_chunk: usize,
    /// Fold every byte into the CRC-64 checksum.
    pub checksum: bool,
    /// Force a sync after this many written bytes. 0 = never.
    pub autosync_bytes: u64,
    pub read_buffer: usize,
    pub write_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FdsetConfig {
    /// Hold fan-out writes until this many bytes are pending. 0 = write-through.
    pub coalesce_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowLogSettings {
    /// Log operations taking at least this long. Negative disables, 0 logs all.
    pub log_slower_than_us: i64,
    pub max_len: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Autosync threshold used when none is configured.
pub const DEFAULT_AUTOSYNC_BYTES: u64 = 32 * 1024 * 1024;

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_chunk: 0,
            checksum: true,
            autosync_bytes: DEFAULT_AUTOSYNC_BYTES,
            read_buffer: 64 * 1024,
            write_buffer: 64 * 1024,
        }
    }
}

impl Default for FdsetConfig {
    fn default() -> Self {
        Self { coalesce_bytes: 0 }
    }
}

impl Default for SlowLogSettings {
    fn default() -> Self {
        Self {
            log_slower_than_us: 10_000,
            max_len: 128,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("sluice")
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

impl SluiceConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            SluiceConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse one config file, no env overrides.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SLUICE_CONFIG")
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
            let text = SluiceConfig::default().to_toml()?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeFailed)
    }

    /// Apply SLUICE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("SLUICE_TRANSPORT__MAX_CHUNK") {
            self.transport.max_chunk = v;
        }
        if let Some(v) = env_parse("SLUICE_TRANSPORT__AUTOSYNC_BYTES") {
            self.transport.autosync_bytes = v;
        }
        if let Ok(v) = std::env::var("SLUICE_TRANSPORT__CHECKSUM") {
            self.transport.checksum = v == "true" || v == "1";
        }
        if let Some(v) = env_parse("SLUICE_FDSET__COALESCE_BYTES") {
            self.fdset.coalesce_bytes = v;
        }
        if let Some(v) = env_parse("SLUICE_SLOWLOG__LOG_SLOWER_THAN_US") {
            self.slowlog.log_slower_than_us = v;
        }
        if let Some(v) = env_parse("SLUICE_SLOWLOG__MAX_LEN") {
            self.slowlog.max_len = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable env override");
            None
        }
    }
}
