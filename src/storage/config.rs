//! JSON Configuration Management
//!
//! Handles reading and writing the runtime configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::settings::RuntimeSettings;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_parent_dir};

/// Configuration service for managing runtime settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    settings: RuntimeSettings,
}

impl ConfigService {
    /// Load ~/.lexbrief/config.json, falling back to defaults when it is missing.
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load settings from `path` (defaults if the file is missing) and apply
    /// environment overrides.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        let mut settings = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            debug!(path = %config_path.display(), "No config file, using defaults");
            RuntimeSettings::default()
        };
        settings.apply_env_overrides(|name| std::env::var(name).ok());
        settings.validate().map_err(AppError::validation)?;
        info!(
            path = %config_path.display(),
            providers = settings.providers.len(),
            "Loaded runtime settings"
        );

        Ok(Self {
            config_path,
            settings,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<RuntimeSettings> {
        let content = fs::read_to_string(path)?;
        let settings: RuntimeSettings = serde_json::from_str(&content)?;
        settings.validate().map_err(AppError::validation)?;
        Ok(settings)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, settings: &RuntimeSettings) -> AppResult<()> {
        settings.validate().map_err(AppError::validation)?;
        ensure_parent_dir(path)?;
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current settings
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Mutable access; call `save` to persist changes
    pub fn settings_mut(&mut self) -> &mut RuntimeSettings {
        &mut self.settings
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current settings to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.settings)
    }

    /// Reset settings to defaults and persist them
    pub fn reset(&mut self) -> AppResult<()> {
        self.settings = RuntimeSettings::default();
        self.save()
    }
}
