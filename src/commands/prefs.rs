//! Preference Commands
//!
//! Show, update and reset stored preference overrides.

use serde_json::{json, Map, Value};
use tracing::info;

use crate::services::preferences::{reset, resolve, resolve_with_report, PreferenceSet, PreferenceStore};
use crate::utils::error::{AppError, AppResult};

/// The effective preferences: stored overrides over the defaults.
pub fn show_preferences(store: &dyn PreferenceStore) -> AppResult<PreferenceSet> {
    Ok(resolve(&store.load_overrides()?))
}

/// Store `options` (a JSON object) for one category. Rejected as a whole when
/// any option is unknown or invalid, so nothing half-applies.
pub fn set_preferences(
    store: &dyn PreferenceStore,
    category: &str,
    options: &str,
) -> AppResult<PreferenceSet> {
    let updates: Map<String, Value> = match serde_json::from_str::<Value>(options)? {
        Value::Object(map) => map,
        _ => return Err(AppError::validation("preference options must be a JSON object")),
    };

    let (_, ignored) = resolve_with_report(&json!({ category: updates }));
    if !ignored.is_empty() {
        return Err(AppError::validation(ignored.join("; ")));
    }

    store.save_overrides(category, &updates)?;
    info!(category, options = updates.len(), "Preferences updated");
    show_preferences(store)
}

/// Drop every stored override and return the defaults.
pub fn reset_preferences(store: &dyn PreferenceStore) -> AppResult<PreferenceSet> {
    store.clear_overrides()?;
    info!("Preferences reset to defaults");
    Ok(reset())
}
