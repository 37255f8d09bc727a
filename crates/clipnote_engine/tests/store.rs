use std::sync::Arc;

use clipnote_core::{DomainRule, InstructionTemplate, Settings, DEFAULT_TEMPLATE_ID};
use clipnote_engine::{keys, FileStore, KeyValueStore, KvSettingsStore, MemoryStore, SettingsStore};
use serde_json::json;

#[tokio::test]
async fn file_store_round_trips_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");

    let store = FileStore::open(path.clone()).expect("open");
    store.set("a", json!({ "x": 1 })).await.expect("set");
    store.set("b", json!("two")).await.expect("set");
    store.remove("a").await.expect("remove");

    // A fresh handle over the same file sees exactly the surviving entries.
    let reopened = FileStore::open(path).expect("reopen");
    assert_eq!(reopened.get("a").await.expect("get"), None);
    assert_eq!(reopened.get("b").await.expect("get"), Some(json!("two")));
}

#[tokio::test]
async fn file_store_overwrites_key_last_write_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::open(dir.path().join("store.json")).expect("open");

    store.set("k", json!(1)).await.expect("set");
    store.set("k", json!(2)).await.expect("set");
    assert_eq!(store.get("k").await.expect("get"), Some(json!(2)));
}

#[tokio::test]
async fn settings_load_defaults_when_absent() {
    let settings_store = KvSettingsStore::new(Arc::new(MemoryStore::new()));
    let settings = settings_store.load().await.expect("load");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.active_template_id, DEFAULT_TEMPLATE_ID);
    assert!(!settings.templates.is_empty());
}

#[tokio::test]
async fn settings_load_merges_partial_shape_with_defaults() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(keys::SETTINGS, json!({ "target_url": "https://n.example.com" }))
        .await
        .expect("seed");

    let settings_store = KvSettingsStore::new(kv);
    let settings = settings_store.load().await.expect("load");
    assert_eq!(settings.target_url, "https://n.example.com");
    // Everything unspecified takes its default.
    assert_eq!(settings.model_name, "gpt-4o-mini");
    assert!(settings.enable_floating_ball);
}

#[tokio::test]
async fn deleting_all_templates_regenerates_builtins_on_load() {
    let kv = Arc::new(MemoryStore::new());
    let settings_store = KvSettingsStore::new(kv);

    let mut settings = Settings::default();
    settings.templates.clear();
    settings.active_template_id = "whatever".to_string();
    settings_store.save(&settings).await.expect("save");

    let loaded = settings_store.load().await.expect("load");
    assert_eq!(loaded.templates, clipnote_core::builtin_templates());
    assert_eq!(loaded.active_template_id, DEFAULT_TEMPLATE_ID);
}

#[tokio::test]
async fn dangling_active_template_id_is_repaired() {
    let kv = Arc::new(MemoryStore::new());
    let settings_store = KvSettingsStore::new(kv);

    let mut settings = Settings::default();
    settings.templates = vec![InstructionTemplate {
        id: "only".to_string(),
        name: "Only".to_string(),
        content: "c {content}".to_string(),
    }];
    settings.active_template_id = "gone".to_string();
    settings_store.save(&settings).await.expect("save");

    let loaded = settings_store.load().await.expect("load");
    assert_eq!(loaded.active_template_id, "only");
}

#[tokio::test]
async fn rules_survive_save_and_load() {
    let settings_store = KvSettingsStore::new(Arc::new(MemoryStore::new()));

    let mut settings = Settings::default();
    settings.domain_rules = vec![DomainRule {
        id: "r1".to_string(),
        domain_pattern: "*.example.com".to_string(),
        template_id: "short-summary".to_string(),
    }];
    settings_store.save(&settings).await.expect("save");

    let loaded = settings_store.load().await.expect("load");
    assert_eq!(loaded.domain_rules, settings.domain_rules);
}

#[tokio::test]
async fn reset_drops_stored_settings() {
    let kv = Arc::new(MemoryStore::new());
    let settings_store = KvSettingsStore::new(kv.clone());

    let mut settings = Settings::default();
    settings.target_url = "https://n.example.com".to_string();
    settings_store.save(&settings).await.expect("save");

    let defaults = settings_store.reset().await.expect("reset");
    assert_eq!(defaults, Settings::default());
    assert_eq!(kv.get(keys::SETTINGS).await.expect("get"), None);
}
