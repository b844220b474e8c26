//! Thread projection: the linear view of one branch.

use tangle_types::message::{MessageNode, Role};
use tangle_types::session::ChatSession;

use crate::ports::HistoryEntry;

/// Reconstruct the active thread, root first.
///
/// Walks `parent_id` links from the session's current leaf. A dangling
/// reference ends the walk early (the thread renders truncated rather
/// than failing), and the traversal is bounded by the node count so a
/// corrupt payload cannot loop forever. Pure, O(depth).
pub fn project_thread(session: &ChatSession) -> Vec<&MessageNode> {
    let mut thread = Vec::new();
    let mut cursor = session.current_leaf_id.as_deref();
    for _ in 0..=session.messages.len() {
        let Some(id) = cursor else {
            break;
        };
        match session.messages.get(id) {
            Some(node) => {
                thread.push(node);
                cursor = node.parent_id.as_deref();
            }
            None => break,
        }
    }
    thread.reverse();
    thread
}

/// Build the ordered history payload for a generation request.
///
/// The projection is prefixed with a synthetic instruction entry: this
/// API surface has no system role, so the persona prompt travels as a
/// user-role preamble. Placeholder and empty nodes (reserved stream
/// targets, blank chat-mode bubbles) are skipped.
pub fn build_history(session: &ChatSession, system_prompt: &str) -> Vec<HistoryEntry> {
    let mut history = vec![HistoryEntry::text(
        Role::User,
        format!("System Instruction: {}", system_prompt),
    )];
    for node in project_thread(session) {
        if node.is_placeholder() {
            continue;
        }
        history.push(HistoryEntry {
            role: node.role,
            content: node.content.clone(),
            attachments: node.attachments.clone(),
        });
    }
    history
}
