//! Application configuration
//!
//! Stored as TOML (or JSON, chosen by file extension) in the platform
//! config directory. Every section falls back to its defaults, so a
//! partial file only overrides what it names.

use crate::error::{SettingsError, SettingsResult};
use fiberpath_core::AxisFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
pub const APP_DIR: &str = "fiberpath-studio";

/// Locating the external CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// Explicit path to the `fiberpath` executable; `PATH` is searched
    /// when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// Reject a second call of the same kind while one is running
    pub reject_duplicate_calls: bool,
}

/// Retry behaviour of gateway calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub plan_max_attempts: u32,
    pub validate_max_attempts: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_multiplier: 2.0,
            plan_max_attempts: 2,
            validate_max_attempts: 2,
        }
    }
}

/// Defaults for the stream panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub baud_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            baud_rate: 250_000,
            port: None,
        }
    }
}

/// Defaults for new projects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub axis_format: AxisFormat,
}

/// File handling preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Capacity of the recent-files list
    pub recent_files_count: usize,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            recent_files_count: 10,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cli: CliSettings,
    pub retry: RetrySettings,
    pub stream: StreamSettings,
    pub project: ProjectSettings,
    pub files: FileSettings,
}

enum Format {
    Toml,
    Json,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(SettingsError::UnsupportedFormat(format!(
            "{} (expected .toml or .json)",
            path.display()
        ))),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/fiberpath-studio`
    pub fn config_dir() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config or home directory".to_string())
            })
    }

    /// `<config dir>/fiberpath-studio/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load and validate configuration from a `.toml` or `.json` file
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            Format::Toml => toml::from_str(&content)?,
            Format::Json => serde_json::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Like [`Config::load_from_file`], but a missing file yields defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate and write to a `.toml` or `.json` file, creating parent
    /// directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Toml => toml::to_string_pretty(self)?,
            Format::Json => serde_json::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn validate(&self) -> SettingsResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(SettingsError::invalid("retry.max_attempts", "must be > 0"));
        }
        if self.retry.plan_max_attempts == 0 {
            return Err(SettingsError::invalid(
                "retry.plan_max_attempts",
                "must be > 0",
            ));
        }
        if self.retry.validate_max_attempts == 0 {
            return Err(SettingsError::invalid(
                "retry.validate_max_attempts",
                "must be > 0",
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(SettingsError::invalid(
                "retry.backoff_multiplier",
                "must be a number >= 1",
            ));
        }
        if self.stream.baud_rate == 0 {
            return Err(SettingsError::invalid("stream.baud_rate", "must be > 0"));
        }
        if self.files.recent_files_count == 0 {
            return Err(SettingsError::invalid(
                "files.recent_files_count",
                "must be > 0",
            ));
        }
        Ok(())
    }
}
