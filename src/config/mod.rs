//! Configuration module for modupipe
//!
//! This module handles runtime configuration including:
//! - Queue capacity and get/put strategies
//! - Retry, repeat and iteration limits for runnables
//! - Logging filter and destination
//!
//! # Config Location
//!
//! The default settings file lives in the platform-appropriate config directory:
//! - **Linux**: `~/.config/modupipe/modupipe.toml`
//! - **macOS**: `~/Library/Application Support/modupipe/modupipe.toml`
//! - **Windows**: `%APPDATA%\modupipe\modupipe.toml`
//!
//! # Formats
//!
//! Files ending in `.json` are read and written as JSON; everything else is TOML.
//! Every field has a default, so a file only needs the values it changes.
//!
//! # Example
//!
//! ```ignore
//! use modupipe::config::Settings;
//!
//! let settings = Settings::load("pipeline.toml")?;
//! let queue = settings.queue.build::<f64>("samples");
//! let source = QueueSource::new(queue.clone(), settings.queue.get);
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "modupipe";

/// Default settings filename
pub const CONFIG_FILE: &str = "modupipe.toml";

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default number of retries after a failed run
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Default batch size for buffering stages
pub const DEFAULT_BUFFER_SIZE: usize = 1;

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,modupipe=debug";

// ==================== Config Directory ====================

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().ok_or_else(|| {
        PipelineError::Config("Could not determine config directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            PipelineError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the default settings file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== File Format ====================

/// On-disk settings format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` selects JSON, anything else TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

// ==================== Settings ====================

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Queue capacity and strategies
    pub queue: QueueSettings,

    /// Runnable limits
    pub runner: RunnerSettings,

    /// Logging setup
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from a TOML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        let settings = Self::parse(&content, ConfigFormat::from_path(path)).map_err(|e| {
            PipelineError::Config(format!("Failed to parse settings {:?}: {}", path, e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a string
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| PipelineError::Serialization(e.to_string()))
            }
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| PipelineError::Serialization(e.to_string())),
        }
    }

    /// Load settings from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path().filter(|p| p.exists()) else {
            return Self::default();
        };

        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings to a TOML or JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Config(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let content = self.render(ConfigFormat::from_path(path))?;

        std::fs::write(path, content).map_err(|e| {
            PipelineError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }

    /// Save settings to the default location
    pub fn save_default(&self) -> Result<PathBuf> {
        let path = ensure_config_dir()?.join(CONFIG_FILE);
        self.save(&path)?;
        Ok(path)
    }

    /// Serialize settings to a string
    pub fn render(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| PipelineError::Serialization(e.to_string())),
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| PipelineError::Serialization(e.to_string())),
        }
    }

    /// Reject values the pipeline stages cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.runner.buffer_size == 0 {
            return Err(PipelineError::Config(
                "runner.buffer_size must be at least 1".to_string(),
            ));
        }
        if self.runner.repeat == 0 {
            tracing::warn!("runner.repeat is 0, nothing will run");
        }
        Ok(())
    }
}

// ==================== Tests ====================
