//! Preference File Store
//!
//! Persists preference overrides as a JSON object in user_preferences.json.
//! Only overrides are written; defaults are never copied into the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::services::preferences::store::{check_category_update, merge_json, PreferenceStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{ensure_parent_dir, preferences_path};

/// JSON-file-backed preference store
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at ~/.lexbrief/user_preferences.json
    pub fn default_location() -> AppResult<Self> {
        Ok(Self::new(preferences_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> AppResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => {
                warn!(path = %self.path.display(), "Preference file is not a JSON object, ignoring it");
                Ok(Map::new())
            }
        }
    }

    fn write(&self, map: &Map<String, Value>) -> AppResult<()> {
        ensure_parent_dir(&self.path)?;
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load_overrides(&self) -> AppResult<Value> {
        Ok(Value::Object(self.read()?))
    }

    fn save_overrides(&self, category: &str, updates: &Map<String, Value>) -> AppResult<()> {
        check_category_update(category, updates)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::internal("preference file lock poisoned"))?;

        let mut map = self.read()?;
        let entry = map
            .entry(category.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        merge_json(entry, &Value::Object(updates.clone()));
        self.write(&map)?;
        info!(category, path = %self.path.display(), "Saved preference overrides");
        Ok(())
    }

    fn clear_overrides(&self) -> AppResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::internal("preference file lock poisoned"))?;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!(path = %self.path.display(), "Cleared preference overrides");
        Ok(())
    }
}
