//! Persistence of client state through the storage port.
//!
//! Each concern is a versioned JSON snapshot under a fixed key. Loads
//! are lenient: a missing or unreadable snapshot yields defaults, never
//! an error. Session payloads written before `root_message_ids` existed
//! are migrated on load by scanning for parentless nodes in timestamp
//! order.

use serde::{Deserialize, Serialize};

use tangle_core::personas::PersonaRoster;
use tangle_core::ports::StoragePort;
use tangle_core::store::ChatStore;
use tangle_types::config::AppSettings;
use tangle_types::persona::Persona;
use tangle_types::session::ChatSession;
use tangle_types::usage::UsageTracker;
use tangle_types::Result;

pub const SESSIONS_KEY: &str = "tangle:sessions";
pub const PERSONAS_KEY: &str = "tangle:personas";
pub const SETTINGS_KEY: &str = "tangle:settings";
pub const USAGE_KEY: &str = "tangle:usage";

/// Current session snapshot layout. Version 3 added `root_message_ids`.
pub const SESSIONS_VERSION: u32 = 3;

#[derive(Serialize, Deserialize)]
struct SessionSnapshot {
    version: u32,
    sessions: Vec<ChatSession>,
    current_session_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct PersonaSnapshot {
    personas: Vec<Persona>,
    active_id: Option<String>,
}

// ─── Sessions ────────────────────────────────────────────────

pub async fn load_sessions(storage: &dyn StoragePort) -> ChatStore {
    let Ok(Some(bytes)) = storage.get(SESSIONS_KEY).await else {
        return ChatStore::new();
    };
    match serde_json::from_slice::<SessionSnapshot>(&bytes) {
        Ok(mut snapshot) => {
            if snapshot.version < SESSIONS_VERSION {
                migrate_sessions(&mut snapshot);
            }
            ChatStore::from_parts(snapshot.sessions, snapshot.current_session_id)
        }
        Err(e) => {
            log::warn!("Discarding unreadable session snapshot: {}", e);
            ChatStore::new()
        }
    }
}

pub async fn save_sessions(storage: &dyn StoragePort, store: &ChatStore) -> Result<()> {
    let snapshot = SessionSnapshot {
        version: SESSIONS_VERSION,
        sessions: store.sessions().to_vec(),
        current_session_id: store.current_session_id().map(String::from),
    };
    storage
        .set(SESSIONS_KEY, &serde_json::to_vec(&snapshot)?)
        .await
}

/// Backfill `root_message_ids` for pre-v3 sessions: all parentless nodes,
/// ordered by creation timestamp.
fn migrate_sessions(snapshot: &mut SessionSnapshot) {
    let mut touched = 0usize;
    for session in &mut snapshot.sessions {
        if !session.root_message_ids.is_empty() || session.messages.is_empty() {
            continue;
        }
        let mut roots: Vec<(i64, String)> = session
            .messages
            .values()
            .filter(|n| n.parent_id.is_none())
            .map(|n| (n.timestamp, n.id.clone()))
            .collect();
        roots.sort();
        session.root_message_ids = roots.into_iter().map(|(_, id)| id).collect();
        touched += 1;
    }
    if touched > 0 {
        log::info!(
            "Migrated {} session(s) from snapshot v{} to v{}",
            touched,
            snapshot.version,
            SESSIONS_VERSION
        );
    }
    snapshot.version = SESSIONS_VERSION;
}

// ─── Personas ────────────────────────────────────────────────

pub async fn load_personas(storage: &dyn StoragePort) -> PersonaRoster {
    let Ok(Some(bytes)) = storage.get(PERSONAS_KEY).await else {
        return PersonaRoster::new();
    };
    match serde_json::from_slice::<PersonaSnapshot>(&bytes) {
        Ok(snapshot) => PersonaRoster::from_parts(snapshot.personas, snapshot.active_id),
        Err(e) => {
            log::warn!("Discarding unreadable persona snapshot: {}", e);
            PersonaRoster::new()
        }
    }
}

pub async fn save_personas(storage: &dyn StoragePort, roster: &PersonaRoster) -> Result<()> {
    let snapshot = PersonaSnapshot {
        personas: roster.personas().to_vec(),
        active_id: roster.active_id().map(String::from),
    };
    storage
        .set(PERSONAS_KEY, &serde_json::to_vec(&snapshot)?)
        .await
}

// ─── Settings ────────────────────────────────────────────────

pub async fn load_settings(storage: &dyn StoragePort) -> AppSettings {
    let Ok(Some(bytes)) = storage.get(SETTINGS_KEY).await else {
        return AppSettings::default();
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        log::warn!("Discarding unreadable settings: {}", e);
        AppSettings::default()
    })
}

pub async fn save_settings(storage: &dyn StoragePort, settings: &AppSettings) -> Result<()> {
    storage
        .set(SETTINGS_KEY, &serde_json::to_vec(settings)?)
        .await
}

// ─── Usage ───────────────────────────────────────────────────

pub async fn load_usage(storage: &dyn StoragePort) -> UsageTracker {
    let Ok(Some(bytes)) = storage.get(USAGE_KEY).await else {
        return UsageTracker::new();
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        log::warn!("Discarding unreadable usage data: {}", e);
        UsageTracker::new()
    })
}

pub async fn save_usage(storage: &dyn StoragePort, usage: &UsageTracker) -> Result<()> {
    storage.set(USAGE_KEY, &serde_json::to_vec(usage)?).await
}
