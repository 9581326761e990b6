//! StudyForge Configuration (v0.4.0)
//!
//! Storage and logging settings for the progress tracker.
//! Config file: $FORGE_CONFIG, ~/.config/studyforge/config.toml or
//! /etc/studyforge/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "FORGE_CONFIG";

/// Where learner progress is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory only (nothing persists)
    Memory,
    /// SQLite file on this device
    Sqlite,
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Sqlite
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file. Defaults to ~/.local/share/studyforge/progress.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved database path
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studyforge")
            .join("progress.db")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main StudyForge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ForgeConfig {
    /// Default user config path: ~/.config/studyforge/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
        Ok(config_dir.join("studyforge").join("config.toml"))
    }

    /// System config path: /etc/studyforge/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/studyforge/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. $FORGE_CONFIG
    /// 2. User config (~/.config/studyforge/config.toml)
    /// 3. System config (/etc/studyforge/config.toml)
    /// 4. Defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ForgeConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::user_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Set storage backend from a CLI value
    pub fn set_backend(&mut self, backend: &str) -> Result<()> {
        self.storage.backend = match backend.to_lowercase().as_str() {
            "memory" | "mem" => StorageBackend::Memory,
            "sqlite" | "db" => StorageBackend::Sqlite,
            _ => anyhow::bail!(
                "Invalid storage backend: '{}'. Valid values: memory, sqlite",
                backend
            ),
        };
        Ok(())
    }
}
