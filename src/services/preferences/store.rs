//! Preference Store Contract
//!
//! Persistence of raw preference overrides. A store only keeps what the user
//! changed; the resolver fills in everything else.

use std::sync::Mutex;

use serde_json::{Map, Value};

use super::types::{PreferenceSet, CATEGORIES};
use crate::utils::error::{AppError, AppResult};

/// Storage backend for preference overrides.
pub trait PreferenceStore: Send + Sync {
    /// All stored overrides as a JSON object (empty object when nothing is stored).
    fn load_overrides(&self) -> AppResult<Value>;

    /// Merge `updates` into the stored overrides for one category.
    fn save_overrides(&self, category: &str, updates: &Map<String, Value>) -> AppResult<()>;

    /// Drop every stored override.
    fn clear_overrides(&self) -> AppResult<()>;
}

/// Reject categories and option names the defaults do not define.
pub fn check_category_update(category: &str, updates: &Map<String, Value>) -> AppResult<()> {
    if !CATEGORIES.contains(&category) {
        return Err(AppError::validation(format!(
            "unknown preference category '{}'",
            category
        )));
    }
    let defaults = serde_json::to_value(PreferenceSet::default())?;
    check_known_keys(&defaults[category], updates, category)
}

fn check_known_keys(defaults: &Value, updates: &Map<String, Value>, path: &str) -> AppResult<()> {
    for (key, value) in updates {
        let child_path = format!("{}.{}", path, key);
        let Some(default_child) = defaults.get(key) else {
            return Err(AppError::validation(format!(
                "unknown preference option '{}'",
                child_path
            )));
        };
        if let (Value::Object(_), Value::Object(nested)) = (default_child, value) {
            check_known_keys(default_child, nested, &child_path)?;
        }
    }
    Ok(())
}

/// Deep-merge `updates` into `target`. Objects merge key by key; anything else replaces.
pub fn merge_json(target: &mut Value, updates: &Value) {
    match (target, updates) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_json(existing, value)
                    }
                    _ => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, updates) => *target = updates.clone(),
    }
}

/// In-memory store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    overrides: Mutex<Map<String, Value>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: Map<String, Value>) -> Self {
        Self {
            overrides: Mutex::new(overrides),
        }
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Map<String, Value>>> {
        self.overrides
            .lock()
            .map_err(|_| AppError::internal("preference store lock poisoned"))
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load_overrides(&self) -> AppResult<Value> {
        Ok(Value::Object(self.lock()?.clone()))
    }

    fn save_overrides(&self, category: &str, updates: &Map<String, Value>) -> AppResult<()> {
        check_category_update(category, updates)?;
        let mut guard = self.lock()?;
        let entry = guard
            .entry(category.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        merge_json(entry, &Value::Object(updates.clone()));
        Ok(())
    }

    fn clear_overrides(&self) -> AppResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}
