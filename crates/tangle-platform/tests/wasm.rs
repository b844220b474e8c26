//! WASM-target tests for tangle-platform (Node.js runtime).
//!
//! Covers MemoryStorage and the persistence layer under
//! wasm32-unknown-unknown via `wasm-pack test --node`.
//! IndexedDB requires a browser and is exercised manually.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

use tangle_core::personas::PersonaRoster;
use tangle_core::ports::StoragePort;
use tangle_core::store::ChatStore;
use tangle_platform::persist::{
    load_personas, load_sessions, load_settings, load_usage, save_personas, save_sessions,
    save_settings, save_usage, SESSIONS_KEY,
};
use tangle_platform::storage::MemoryStorage;
use tangle_types::config::{AppSettings, StorageBackendType};
use tangle_types::message::Role;
use tangle_types::usage::UsageTracker;

// ─── MemoryStorage Tests ─────────────────────────────────

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
async fn memory_storage_get_missing() {
    let storage = MemoryStorage::new();
    assert!(storage.get("nonexistent").await.unwrap().is_none());
}

#[wasm_bindgen_test]
async fn memory_storage_set_get_overwrite() {
    let storage = MemoryStorage::new();
    storage.set("key", b"v1").await.unwrap();
    storage.set("key", b"v2").await.unwrap();
    assert_eq!(storage.get("key").await.unwrap(), Some(b"v2".to_vec()));
}

#[wasm_bindgen_test]
async fn memory_storage_delete() {
    let storage = MemoryStorage::new();
    storage.set("key", b"val").await.unwrap();
    storage.delete("key").await.unwrap();
    assert!(storage.get("key").await.unwrap().is_none());
    storage.delete("nonexistent").await.unwrap();
}

#[wasm_bindgen_test]
async fn memory_storage_list_keys_by_prefix() {
    let storage = MemoryStorage::new();
    storage.set("tangle:a", b"1").await.unwrap();
    storage.set("tangle:b", b"2").await.unwrap();
    storage.set("other:c", b"3").await.unwrap();

    let keys = storage.list_keys("tangle:").await.unwrap();
    assert_eq!(keys, vec!["tangle:a", "tangle:b"]);
}

#[wasm_bindgen_test]
async fn memory_storage_exists() {
    let storage = MemoryStorage::new();
    assert!(!storage.exists("key").await.unwrap());
    storage.set("key", b"val").await.unwrap();
    assert!(storage.exists("key").await.unwrap());
}

// ─── Session persistence ─────────────────────────────────

#[wasm_bindgen_test]
async fn sessions_roundtrip() {
    let storage = MemoryStorage::new();

    let mut store = ChatStore::new();
    let sid = store.create_session();
    store.append_message(&sid, Role::User, "Hello", Vec::new());
    store.append_message(&sid, Role::Model, "Hi there", Vec::new());

    save_sessions(&storage, &store).await.unwrap();
    let restored = load_sessions(&storage).await;

    assert_eq!(restored.sessions().len(), 1);
    assert_eq!(restored.current_session_id(), Some(sid.as_str()));
    let session = restored.session(&sid).unwrap();
    assert_eq!(session.title, "Hello");
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.root_message_ids.len(), 1);
}

#[wasm_bindgen_test]
async fn sessions_load_missing_yields_empty() {
    let storage = MemoryStorage::new();
    let store = load_sessions(&storage).await;
    assert!(store.sessions().is_empty());
    assert!(store.current_session_id().is_none());
}

#[wasm_bindgen_test]
async fn sessions_load_garbage_yields_empty() {
    let storage = MemoryStorage::new();
    storage.set(SESSIONS_KEY, b"{not json").await.unwrap();
    let store = load_sessions(&storage).await;
    assert!(store.sessions().is_empty());
}

#[wasm_bindgen_test]
async fn sessions_migration_backfills_root_ids() {
    let storage = MemoryStorage::new();

    // A v2 snapshot: session without root_message_ids, two roots with
    // out-of-order timestamps.
    let snapshot = r#"{
        "version": 2,
        "sessions": [{
            "id": "s1",
            "title": "Old",
            "messages": {
                "n2": {"id": "n2", "role": "user", "content": "later root",
                       "timestamp": 2000, "parent_id": null, "children_ids": []},
                "n1": {"id": "n1", "role": "user", "content": "early root",
                       "timestamp": 1000, "parent_id": null, "children_ids": ["n3"]},
                "n3": {"id": "n3", "role": "model", "content": "reply",
                       "timestamp": 1500, "parent_id": "n1", "children_ids": []}
            },
            "current_leaf_id": "n3",
            "created_at": 900
        }],
        "current_session_id": "s1"
    }"#;
    storage.set(SESSIONS_KEY, snapshot.as_bytes()).await.unwrap();

    let store = load_sessions(&storage).await;
    let session = store.session("s1").unwrap();
    assert_eq!(session.root_message_ids, vec!["n1", "n2"]);
    assert_eq!(session.current_leaf_id.as_deref(), Some("n3"));
}

// ─── Persona / settings / usage persistence ──────────────

#[wasm_bindgen_test]
async fn personas_roundtrip() {
    let storage = MemoryStorage::new();
    let mut roster = PersonaRoster::new();
    roster.set_active("coder");
    roster.update("coder", |p| p.chat_mode = true);

    save_personas(&storage, &roster).await.unwrap();
    let restored = load_personas(&storage).await;

    assert_eq!(restored.active_id(), Some("coder"));
    assert!(restored.get("coder").unwrap().chat_mode);
}

#[wasm_bindgen_test]
async fn personas_load_missing_yields_defaults() {
    let storage = MemoryStorage::new();
    let roster = load_personas(&storage).await;
    assert_eq!(roster.personas().len(), 3);
    assert_eq!(roster.active_id(), Some("default"));
}

#[wasm_bindgen_test]
async fn settings_roundtrip() {
    let storage = MemoryStorage::new();
    let settings = AppSettings {
        api_key: "AIza-test-key".to_string(),
        storage: StorageBackendType::Memory,
    };
    save_settings(&storage, &settings).await.unwrap();
    assert_eq!(load_settings(&storage).await, settings);
}

#[wasm_bindgen_test]
async fn usage_roundtrip() {
    let storage = MemoryStorage::new();
    let mut usage = UsageTracker::new();
    usage.record("gemini-2.0-flash", 100, 40);
    save_usage(&storage, &usage).await.unwrap();
    assert_eq!(load_usage(&storage).await.total_tokens(), 140);
}
