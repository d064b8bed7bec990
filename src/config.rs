use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CadenceConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub session: SessionConfig,
    pub rollover: RolloverConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Remote collaborator settings. An empty `base_url` means local-only operation.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
}

/// Credentials handed to the session provider. Both fields must be set for a
/// session to exist.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SessionConfig {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RolloverConfig {
    pub poll_interval_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_cadence_dir()
            .join("habits.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
        }
    }
}

impl RolloverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl RemoteConfig {
    /// `Some(url)` without a trailing slash, or `None` when unconfigured.
    pub fn base_url(&self) -> Option<&str> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Returns `~/.cadence/`, or `./.cadence/` when no home directory is known.
pub fn default_cadence_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cadence")
}

/// Returns the default config file path: `~/.cadence/config.toml`
pub fn default_config_path() -> PathBuf {
    default_cadence_dir().join("config.toml")
}

impl CadenceConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CadenceConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (CADENCE_DB, CADENCE_LOG_LEVEL,
    /// CADENCE_REMOTE_URL, CADENCE_USER, CADENCE_TOKEN).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CADENCE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CADENCE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("CADENCE_REMOTE_URL") {
            self.remote.base_url = val;
        }
        if let Ok(val) = std::env::var("CADENCE_USER") {
            self.session.user_id = Some(val);
        }
        if let Ok(val) = std::env::var("CADENCE_TOKEN") {
            self.session.token = Some(val);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
