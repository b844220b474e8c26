//! Transient UI state that drives rendering.
//!
//! The tree store is the source of truth for all message content; this
//! struct only holds what exists between frames on the UI side: the
//! input drafts, the busy flag, and the status line. It is updated each
//! frame by draining the event bus.

use tangle_types::event::ChatEvent;
use tangle_types::persona::Persona;

/// In-progress edit of a user message (branch-on-submit).
#[derive(Clone)]
pub struct EditDraft {
    pub node_id: String,
    pub text: String,
}

/// In-progress rename of a session title.
#[derive(Clone)]
pub struct RenameDraft {
    pub session_id: String,
    pub title: String,
}

pub struct UiState {
    /// Composer content
    pub input_text: String,
    /// Message being edited, if any
    pub editing: Option<EditDraft>,
    /// Session title being renamed, if any
    pub rename_draft: Option<RenameDraft>,
    /// Working copy of the active persona for the settings panel;
    /// compared by value against the roster to detect dirty state
    pub persona_draft: Option<Persona>,
    /// Whether the settings panel is open
    pub show_settings: bool,
    /// A generation is in flight (gates send/edit actions)
    pub generating: bool,
    /// Node currently receiving stream output
    pub streaming_node: Option<String>,
    /// Status line text
    pub status_text: String,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            input_text: String::new(),
            editing: None,
            rename_draft: None,
            persona_draft: None,
            show_settings: false,
            generating: false,
            streaming_node: None,
            status_text: "Ready".to_string(),
        }
    }

    /// Process events drained from the bus and update UI state.
    pub fn process_events(&mut self, events: &[ChatEvent]) {
        for event in events {
            match event {
                ChatEvent::GenerationStarted { node_id, .. } => {
                    self.generating = true;
                    self.streaming_node = Some(node_id.clone());
                    self.status_text = "Generating...".to_string();
                }
                ChatEvent::Delta { node_id, .. } | ChatEvent::BubbleOpened { node_id, .. } => {
                    self.streaming_node = Some(node_id.clone());
                }
                ChatEvent::GenerationCompleted { .. } => {
                    self.generating = false;
                    self.streaming_node = None;
                    self.status_text = "Ready".to_string();
                }
                ChatEvent::GenerationCancelled { .. } => {
                    self.generating = false;
                    self.streaming_node = None;
                    self.status_text = "Stopped".to_string();
                }
                ChatEvent::GenerationFailed { message, .. } => {
                    self.generating = false;
                    self.streaming_node = None;
                    self.status_text = format!("Error: {}", message);
                }
                ChatEvent::UsageReported { .. } => {}
            }
        }
    }

    /// Whether user actions that start or mutate a stream are gated off.
    /// Only one generation may be in flight per session.
    pub fn is_busy(&self) -> bool {
        self.generating
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
