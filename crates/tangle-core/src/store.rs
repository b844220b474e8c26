//! The branching conversation tree store.
//!
//! Messages form a forest, not a list: editing or regenerating creates a
//! new sibling branch and moves the leaf pointer, it never rewrites
//! history. Streaming mutates node content in place through
//! [`ChatStore::update_content`] only, so a stream commit can interleave
//! with sibling navigation without corrupting the tree: their write sets
//! do not overlap.
//!
//! Every operation is total over stale input: a missing session or node
//! id is a silent no-op, never a panic. Streaming callbacks can outlive
//! the session they were started for (the user may delete it mid-stream).

use std::collections::HashMap;

use tangle_types::message::{Attachment, MessageNode, Role};
use tangle_types::session::{ChatSession, SessionSummary};

/// Maximum characters of the first user message used as a session title.
const TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingDirection {
    Prev,
    Next,
}

/// Owns every session and the pointer to the one being viewed.
pub struct ChatStore {
    sessions: Vec<ChatSession>,
    current_session_id: Option<String>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            current_session_id: None,
        }
    }

    /// Rebuild a store from persisted parts. A current-session id that no
    /// longer resolves is dropped.
    pub fn from_parts(sessions: Vec<ChatSession>, current_session_id: Option<String>) -> Self {
        let current_session_id =
            current_session_id.filter(|id| sessions.iter().any(|s| &s.id == id));
        Self {
            sessions,
            current_session_id,
        }
    }

    // ─── Session management ──────────────────────────────────

    /// Create an empty session, insert it first, and make it current.
    pub fn create_session(&mut self) -> String {
        let session = ChatSession::new();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.current_session_id = Some(id.clone());
        id
    }

    pub fn select_session(&mut self, session_id: &str) {
        if self.sessions.iter().any(|s| s.id == session_id) {
            self.current_session_id = Some(session_id.to_string());
        }
    }

    pub fn rename_session(&mut self, session_id: &str, title: impl Into<String>) {
        if let Some(session) = self.session_mut(session_id) {
            session.title = title.into();
        }
    }

    pub fn delete_session(&mut self, session_id: &str) {
        self.sessions.retain(|s| s.id != session_id);
        if self.current_session_id.as_deref() == Some(session_id) {
            self.current_session_id = None;
        }
    }

    pub fn clear_sessions(&mut self) {
        self.sessions.clear();
        self.current_session_id = None;
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(|s| s.summary()).collect()
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        let id = self.current_session_id.as_deref()?;
        self.session(id)
    }

    pub fn session(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    fn session_mut(&mut self, session_id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    // ─── Tree mutations ──────────────────────────────────────

    /// Append a message at the tip of the active thread.
    ///
    /// The new node's parent is the session's current leaf; it is recorded
    /// in the parent's `children_ids` (or in `root_message_ids` when the
    /// session is empty) and becomes the new current leaf. The first user
    /// message also titles the session. Returns the new node id so callers
    /// can target it for streaming updates; `None` if the session is gone.
    pub fn append_message(
        &mut self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Option<String> {
        let session = self.session_mut(session_id)?;

        // A leaf pointer to a vanished node degrades to starting a new root.
        let parent_id = session
            .current_leaf_id
            .clone()
            .filter(|id| session.messages.contains_key(id));

        let node = MessageNode::new(role, content, parent_id.clone(), attachments);
        let node_id = node.id.clone();

        if session.messages.is_empty() && role == Role::User {
            session.title = derive_title(&node.content);
        }

        session.messages.insert(node_id.clone(), node);
        match parent_id {
            Some(ref pid) => {
                if let Some(parent) = session.messages.get_mut(pid) {
                    parent.children_ids.push(node_id.clone());
                }
            }
            None => session.root_message_ids.push(node_id.clone()),
        }
        session.current_leaf_id = Some(node_id.clone());

        Some(node_id)
    }

    /// Branch on edit: create a sibling of `original_id` carrying the new
    /// content and switch the view to it. The original node is untouched;
    /// the old branch stays reachable through sibling navigation.
    pub fn edit_message(
        &mut self,
        session_id: &str,
        original_id: &str,
        new_content: impl Into<String>,
    ) {
        let Some(session) = self.session_mut(session_id) else {
            return;
        };
        let Some(original) = session.messages.get(original_id) else {
            return;
        };

        let role = original.role;
        let parent_id = original
            .parent_id
            .clone()
            .filter(|id| session.messages.contains_key(id));

        let node = MessageNode::new(role, new_content, parent_id.clone(), Vec::new());
        let node_id = node.id.clone();

        session.messages.insert(node_id.clone(), node);
        match parent_id {
            Some(ref pid) => {
                if let Some(parent) = session.messages.get_mut(pid) {
                    parent.children_ids.push(node_id.clone());
                }
            }
            None => session.root_message_ids.push(node_id.clone()),
        }
        session.current_leaf_id = Some(node_id);
    }

    /// In-place content replacement for streaming. Tree shape and the leaf
    /// pointer are untouched, so this is safe to call on every chunk.
    pub fn update_content(&mut self, session_id: &str, node_id: &str, new_content: impl Into<String>) {
        if let Some(session) = self.session_mut(session_id) {
            if let Some(node) = session.messages.get_mut(node_id) {
                node.content = new_content.into();
            }
        }
    }

    // ─── Branch navigation ───────────────────────────────────

    /// Move to the previous/next sibling of `node_id` and resume that
    /// branch at its most recently created leaf. Clamped at either end,
    /// no wraparound; a no-op when there is nowhere to go.
    pub fn navigate_sibling(
        &mut self,
        session_id: &str,
        node_id: &str,
        direction: SiblingDirection,
    ) {
        let Some(session) = self.session_mut(session_id) else {
            return;
        };
        let Some(node) = session.messages.get(node_id) else {
            return;
        };

        let siblings: &[String] = match node.parent_id.as_deref() {
            Some(pid) => match session.messages.get(pid) {
                Some(parent) => &parent.children_ids,
                None => return,
            },
            None => &session.root_message_ids,
        };
        if siblings.len() <= 1 {
            return;
        }
        let Some(index) = siblings.iter().position(|id| id == node_id) else {
            return;
        };

        let target_index = match direction {
            SiblingDirection::Prev => index.saturating_sub(1),
            SiblingDirection::Next => (index + 1).min(siblings.len() - 1),
        };
        if target_index == index {
            return;
        }

        let target_id = siblings[target_index].clone();
        let leaf = most_recent_leaf(&session.messages, &target_id);
        session.current_leaf_id = Some(leaf);
    }

    /// `(index, total)` of `node_id` within its sibling set, for the
    /// `‹ i/n ›` navigation widget.
    pub fn sibling_position(&self, session_id: &str, node_id: &str) -> Option<(usize, usize)> {
        let session = self.session(session_id)?;
        let node = session.messages.get(node_id)?;
        let siblings: &[String] = match node.parent_id.as_deref() {
            Some(pid) => &session.messages.get(pid)?.children_ids,
            None => &session.root_message_ids,
        };
        let index = siblings.iter().position(|id| id == node_id)?;
        Some((index, siblings.len()))
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Descend from `start` along *last* children until a leaf.
///
/// The last child is always the most recently created continuation (a
/// regeneration or edit supersedes earlier attempts), so branch switches
/// deterministically resume the newest version of the chosen branch.
/// Deliberate policy: most-recent wins over first-created.
fn most_recent_leaf(messages: &HashMap<String, MessageNode>, start: &str) -> String {
    let mut current = start.to_string();
    // Descent is bounded by the node count; corrupt persisted data must
    // not hang the event loop.
    for _ in 0..=messages.len() {
        match messages.get(&current) {
            Some(node) if !node.children_ids.is_empty() => {
                current = node.children_ids[node.children_ids.len() - 1].clone();
            }
            _ => break,
        }
    }
    current
}

fn derive_title(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    if content.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}
