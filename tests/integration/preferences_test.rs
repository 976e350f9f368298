//! Preferences Integration Tests
//!
//! Resolution against the compiled defaults and persistence through the
//! JSON file store.

use lexbrief::services::preferences::{resolve, PreferenceSet, PreferenceStore};
use lexbrief::storage::{ConfigService, JsonFilePreferenceStore};
use serde_json::{json, Map, Value};

/// Every object key path in `value`.
fn key_paths(value: &Value, prefix: &str, out: &mut Vec<String>) {
    if let Value::Object(map) = value {
        for (key, child) in map {
            let path = format!("{}/{}", prefix, key);
            out.push(path.clone());
            key_paths(child, &path, out);
        }
    }
}

#[test]
fn test_resolve_empty_is_idempotent() {
    let first = serde_json::to_string(&resolve(&json!({}))).unwrap();
    let second = serde_json::to_string(&resolve(&json!({}))).unwrap();
    let defaults = serde_json::to_string(&PreferenceSet::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, defaults);
}

#[test]
fn test_merge_never_drops_options() {
    let mut default_paths = Vec::new();
    key_paths(&serde_json::to_value(PreferenceSet::default()).unwrap(), "", &mut default_paths);

    let overrides = [
        json!({"llm": {"temperature": 0.2}}),
        json!({"integration": {"legal_apis": {"courtlistener_enabled": true}}}),
        json!({"general": {"verbosity_level": "detailed"}, "privacy": {"anonymize_data": true}}),
        json!({"citation": {"format": "harvard"}}),
        json!({"unknown": {"x": 1}}),
    ];
    for o in overrides {
        let mut paths = Vec::new();
        key_paths(&serde_json::to_value(resolve(&o)).unwrap(), "", &mut paths);
        assert_eq!(paths, default_paths, "options dropped for {}", o);
    }
}

#[test]
fn test_nested_override_merges_key_by_key() {
    let prefs = resolve(&json!({"integration": {"legal_apis": {"courtlistener_enabled": true}}}));
    assert!(prefs.integration.legal_apis.courtlistener_enabled);
    assert!(!prefs.integration.legal_apis.caselaw_access_enabled);
    assert!(prefs.integration.export_destinations.local_download);
}

#[test]
fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("user_preferences.json");
    let store = JsonFilePreferenceStore::new(&path);

    assert_eq!(store.load_overrides().unwrap(), json!({}));

    let mut updates = Map::new();
    updates.insert("format".to_string(), json!("chicago"));
    store.save_overrides("citation", &updates).unwrap();

    let mut more = Map::new();
    more.insert("normalize_citations".to_string(), json!(false));
    store.save_overrides("citation", &more).unwrap();

    // A fresh store sees what the first one wrote
    let reopened = JsonFilePreferenceStore::new(&path);
    let prefs = resolve(&reopened.load_overrides().unwrap());
    assert_eq!(prefs.citation.format.to_string(), "chicago");
    assert!(!prefs.citation.normalize_citations);
    assert!(prefs.citation.include_citations_in_brief);

    reopened.clear_overrides().unwrap();
    assert_eq!(resolve(&reopened.load_overrides().unwrap()), PreferenceSet::default());
}

#[test]
fn test_file_store_rejects_unknown_category() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFilePreferenceStore::new(dir.path().join("prefs.json"));
    let mut updates = Map::new();
    updates.insert("theme".to_string(), json!("dark"));
    assert!(store.save_overrides("appearance", &updates).is_err());
    assert!(!dir.path().join("prefs.json").exists());
}

#[test]
fn test_config_file_defaults_and_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut service = ConfigService::open(&path).unwrap();
    assert_eq!(service.settings().pipeline_deadline_secs, 300);
    assert_eq!(service.settings().scoring.model_weight, 0.4);

    service.settings_mut().max_document_chars = 1_000;
    service.save().unwrap();

    let reopened = ConfigService::open(&path).unwrap();
    assert_eq!(reopened.settings().max_document_chars, 1_000);
}
