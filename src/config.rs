//! Configuration management for maintgate.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::GateError;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/maintgate/config.yaml";

/// Environment variable checked for the config-level bypass secret
pub const SECRET_ENV_VAR: &str = "MAINTGATE_SECRET_BYPASS_KEY";

/// Secure string type that zeroizes memory on drop
/// Used for bypass secrets
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Runtime environment (production, development, testing)
    pub environment: Environment,

    /// Where the maintenance record lives
    pub storage: StorageConfig,

    /// Static gate settings
    pub gate: GateConfig,

    /// Duration used by `down` when none is given
    pub default_duration_minutes: u64,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.gate.apply_env_secret();
        config.validate()?;

        Ok(config)
    }

    /// Load the config file, or defaults if it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.file_name.is_empty() {
            return Err(GateError::Config("storage.file_name cannot be empty".into()).into());
        }

        if self.storage.file_name.contains('/') || self.storage.file_name.contains('\\') {
            return Err(GateError::Config(format!(
                "storage.file_name must be a plain file name, got '{}'",
                self.storage.file_name
            ))
            .into());
        }

        if self.storage.cache_key.trim().is_empty() {
            return Err(GateError::Config("storage.cache_key cannot be empty".into()).into());
        }

        if self.storage.cache_path.as_os_str().is_empty() {
            return Err(GateError::Config("storage.cache_path cannot be empty".into()).into());
        }

        if self.gate.secret_bypass_enabled && self.gate.effective_secret().is_empty() {
            return Err(GateError::Config(format!(
                "gate.secret_bypass_enabled is true but no secret key is configured \
                 (set gate.secret_bypass_key or {})",
                SECRET_ENV_VAR
            ))
            .into());
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;

        let parent_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", parent_dir))?;
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
    /// Automated test runs: operator-context requests are still evaluated
    Testing,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Durable JSON file (default)
    #[default]
    File,
    /// Key/value cache shared by the CLI and the application
    Cache,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory holding the maintenance file
    pub file_path: PathBuf,

    /// Maintenance file name inside `file_path`
    pub file_name: String,

    /// Cache key for the maintenance record
    pub cache_key: String,

    /// Cache TTL in seconds (0 = no expiration)
    pub cache_ttl: u64,

    /// Directory of the shared on-disk cache used by the CLI
    pub cache_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            file_path: PathBuf::from("/var/lib/maintgate"),
            file_name: "down".to_string(),
            cache_key: "maintenance_mode_data".to_string(),
            cache_ttl: 0,
            cache_path: PathBuf::from("/var/lib/maintgate/cache"),
        }
    }
}

impl StorageConfig {
    /// Full path of the maintenance file
    pub fn record_path(&self) -> PathBuf {
        self.file_path.join(&self.file_name)
    }
}

/// Static gate settings supplied by the embedding application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Allow bypass via `?maintenance_secret=<key>`, checked before the record's own secret
    pub secret_bypass_enabled: bool,

    /// Key can be set directly or via MAINTGATE_SECRET_BYPASS_KEY env var
    /// Memory is securely zeroed when dropped
    pub secret_bypass_key: SecureString,

    /// Environment variable name to read the key from (optional)
    pub secret_bypass_key_env: Option<String>,

    /// Message used when the record carries none
    pub default_message: String,

    /// Retry-After hint for blocked responses
    pub retry_after_seconds: u64,

    /// Emit gate events and storage logs
    pub logging_enabled: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            secret_bypass_enabled: false,
            secret_bypass_key: SecureString::default(),
            secret_bypass_key_env: None,
            default_message:
                "We are currently performing scheduled maintenance. Please try again later."
                    .to_string(),
            retry_after_seconds: 3600,
            logging_enabled: true,
        }
    }
}

impl GateConfig {
    /// Get the effective bypass key, checking env vars first
    /// Returns a SecureString that will be zeroed when dropped
    pub fn effective_secret(&self) -> SecureString {
        if let Some(ref env_name) = self.secret_bypass_key_env {
            if let Ok(val) = env::var(env_name) {
                return SecureString::new(val);
            }
        }
        if let Ok(val) = env::var(SECRET_ENV_VAR) {
            return SecureString::new(val);
        }
        self.secret_bypass_key.clone()
    }

    /// Resolve the env override once so the request path never reads env vars.
    pub fn apply_env_secret(&mut self) {
        self.secret_bypass_key = self.effective_secret();
    }

    /// Config-level secret, if the channel is usable.
    pub fn secret(&self) -> Option<&str> {
        (self.secret_bypass_enabled && !self.secret_bypass_key.is_empty())
            .then(|| self.secret_bypass_key.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            storage: StorageConfig::default(),
            gate: GateConfig::default(),
            default_duration_minutes: 60,
        }
    }
}
