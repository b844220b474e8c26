#[cfg(test)]
mod tests {
    use crate::state::*;
    use tangle_types::event::ChatEvent;

    // ─── UiState Tests ───────────────────────────────────────

    #[test]
    fn test_ui_state_initial() {
        let state = UiState::new();
        assert!(state.input_text.is_empty());
        assert!(state.editing.is_none());
        assert!(state.rename_draft.is_none());
        assert!(state.persona_draft.is_none());
        assert!(!state.show_settings);
        assert!(!state.is_busy());
        assert!(state.streaming_node.is_none());
        assert_eq!(state.status_text, "Ready");
    }

    #[test]
    fn test_ui_state_generation_started() {
        let mut state = UiState::new();
        state.process_events(&[ChatEvent::GenerationStarted {
            session_id: "s1".to_string(),
            node_id: "n1".to_string(),
        }]);

        assert!(state.is_busy());
        assert_eq!(state.streaming_node.as_deref(), Some("n1"));
        assert_eq!(state.status_text, "Generating...");
    }

    #[test]
    fn test_ui_state_bubble_moves_streaming_target() {
        let mut state = UiState::new();
        state.process_events(&[
            ChatEvent::GenerationStarted {
                session_id: "s1".to_string(),
                node_id: "n1".to_string(),
            },
            ChatEvent::BubbleOpened {
                session_id: "s1".to_string(),
                node_id: "n2".to_string(),
            },
        ]);
        assert_eq!(state.streaming_node.as_deref(), Some("n2"));
        assert!(state.is_busy());
    }

    #[test]
    fn test_ui_state_generation_completed() {
        let mut state = UiState::new();
        state.generating = true;
        state.streaming_node = Some("n1".to_string());

        state.process_events(&[ChatEvent::GenerationCompleted {
            session_id: "s1".to_string(),
        }]);

        assert!(!state.is_busy());
        assert!(state.streaming_node.is_none());
        assert_eq!(state.status_text, "Ready");
    }

    #[test]
    fn test_ui_state_generation_cancelled() {
        let mut state = UiState::new();
        state.generating = true;

        state.process_events(&[ChatEvent::GenerationCancelled {
            session_id: "s1".to_string(),
        }]);

        assert!(!state.is_busy());
        assert_eq!(state.status_text, "Stopped");
    }

    #[test]
    fn test_ui_state_generation_failed() {
        let mut state = UiState::new();
        state.generating = true;

        state.process_events(&[ChatEvent::GenerationFailed {
            session_id: "s1".to_string(),
            message: "Provider error: rate limit".to_string(),
        }]);

        assert!(!state.is_busy());
        assert!(state.status_text.contains("rate limit"));
    }

    #[test]
    fn test_ui_state_usage_event_is_inert() {
        let mut state = UiState::new();
        state.process_events(&[ChatEvent::UsageReported {
            model: "m".to_string(),
            input_tokens: 1,
            output_tokens: 1,
        }]);
        assert!(!state.is_busy());
        assert_eq!(state.status_text, "Ready");
    }

    #[test]
    fn test_ui_state_full_generation_lifecycle() {
        let mut state = UiState::new();

        state.process_events(&[ChatEvent::GenerationStarted {
            session_id: "s1".to_string(),
            node_id: "n1".to_string(),
        }]);
        assert!(state.is_busy());

        state.process_events(&[
            ChatEvent::Delta {
                session_id: "s1".to_string(),
                node_id: "n1".to_string(),
            },
            ChatEvent::UsageReported {
                model: "m".to_string(),
                input_tokens: 5,
                output_tokens: 2,
            },
            ChatEvent::GenerationCompleted {
                session_id: "s1".to_string(),
            },
        ]);

        assert!(!state.is_busy());
        assert_eq!(state.status_text, "Ready");
        assert!(state.streaming_node.is_none());
    }
}
