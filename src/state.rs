//! Application State
//!
//! Services the CLI commands share: runtime settings and the preference
//! store. The pipeline is built on demand because only `run` needs providers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::services::pipeline::Pipeline;
use crate::services::preferences::PreferenceStore;
use crate::storage::{ConfigService, JsonFilePreferenceStore};
use crate::utils::error::AppResult;

/// Application state for one CLI invocation
pub struct AppState {
    config: ConfigService,
    preferences: Arc<dyn PreferenceStore>,
}

impl AppState {
    /// Open config and preference files, at the default locations unless given.
    pub fn open(config_path: Option<PathBuf>, preferences_path: Option<PathBuf>) -> AppResult<Self> {
        let config = match config_path {
            Some(path) => ConfigService::open(path)?,
            None => ConfigService::new()?,
        };
        let preferences: Arc<dyn PreferenceStore> = match preferences_path {
            Some(path) => Arc::new(JsonFilePreferenceStore::new(path)),
            None => Arc::new(JsonFilePreferenceStore::default_location()?),
        };
        Ok(Self::with_parts(config, preferences))
    }

    pub fn with_parts(config: ConfigService, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            config,
            preferences,
        }
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.preferences.as_ref()
    }

    /// Build a pipeline from the current runtime settings.
    pub fn pipeline(&self) -> AppResult<Pipeline> {
        Pipeline::from_settings(self.config.settings().clone())
    }
}
