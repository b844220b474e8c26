use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::message::MessageNode;

/// A conversation stored as a tree of message nodes.
///
/// `messages` owns every node of the session; nodes never move between
/// sessions and are never deleted individually, only the session as a
/// whole unit. `root_message_ids` and every node's `children_ids` are
/// append-only, which is what keeps superseded branches navigable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: HashMap<String, MessageNode>,
    /// Top-level nodes (no parent) in creation order. `default` so
    /// payloads persisted before this field existed still deserialize;
    /// the persistence layer backfills it on load.
    #[serde(default)]
    pub root_message_ids: Vec<String>,
    /// Tip of the branch currently viewed/extended. None only while the
    /// session has no messages.
    pub current_leaf_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub persona_id: Option<String>,
    pub created_at: i64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: "New Chat".to_string(),
            messages: HashMap::new(),
            root_message_ids: Vec::new(),
            current_leaf_id: None,
            persona_id: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&MessageNode> {
        self.messages.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            message_count: self.messages.len(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Lightweight view of a session for sidebar listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub message_count: usize,
}
