#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::*;
    use crate::event::*;
    use crate::message::*;
    use crate::persona::*;
    use crate::session::*;
    use crate::usage::*;

    // ─── MessageNode Tests ───────────────────────────────────

    #[test]
    fn test_node_new_user() {
        let node = MessageNode::new(Role::User, "Hello", None, Vec::new());
        assert_eq!(node.role, Role::User);
        assert_eq!(node.content, "Hello");
        assert!(node.parent_id.is_none());
        assert!(node.children_ids.is_empty());
        assert!(node.is_root());
        assert!(node.is_leaf());
        assert!(!node.id.is_empty());
    }

    #[test]
    fn test_node_new_with_parent() {
        let parent = MessageNode::new(Role::User, "Hi", None, Vec::new());
        let child = MessageNode::new(Role::Model, "Hello there", Some(parent.id.clone()), Vec::new());
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));
        assert!(!child.is_root());
    }

    #[test]
    fn test_node_placeholder_detection() {
        let mut node = MessageNode::new(Role::Model, PLACEHOLDER, None, Vec::new());
        assert!(node.is_placeholder());

        node.content = String::new();
        assert!(node.is_placeholder());

        node.content = "  ".to_string();
        assert!(node.is_placeholder());

        node.content = "real text".to_string();
        assert!(!node.is_placeholder());
    }

    #[test]
    fn test_node_error_detection() {
        let mut node = MessageNode::new(Role::Model, "fine", None, Vec::new());
        assert!(!node.is_error());

        node.content = format!("{}something broke", ERROR_PREFIX);
        assert!(node.is_error());
    }

    #[test]
    fn test_node_ids_are_unique() {
        let a = MessageNode::new(Role::User, "a", None, Vec::new());
        let b = MessageNode::new(Role::User, "b", None, Vec::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_node_serialization_roundtrip() {
        let node = MessageNode::new(
            Role::Model,
            "streamed",
            Some("parent-1".to_string()),
            vec![Attachment {
                id: "att-1".to_string(),
                kind: AttachmentKind::Image,
                mime_type: "image/png".to_string(),
                data: "aGVsbG8=".to_string(),
                name: "shot.png".to_string(),
            }],
        );
        let json = serde_json::to_string(&node).unwrap();
        let back: MessageNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Model);
        assert_eq!(back.content, "streamed");
        assert_eq!(back.parent_id.as_deref(), Some("parent-1"));
        assert_eq!(back.attachments.len(), 1);
        assert_eq!(back.attachments[0].kind, AttachmentKind::Image);
    }

    #[test]
    fn test_node_deserializes_without_children_field() {
        // Persisted payloads from before children tracking existed
        let json = r#"{
            "id": "n1",
            "role": "user",
            "content": "hi",
            "timestamp": 1000,
            "parent_id": null
        }"#;
        let node: MessageNode = serde_json::from_str(json).unwrap();
        assert!(node.children_ids.is_empty());
        assert!(node.attachments.is_empty());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), r#""model""#);

        let role: Role = serde_json::from_str(r#""model""#).unwrap();
        assert_eq!(role, Role::Model);
    }

    // ─── ChatSession Tests ───────────────────────────────────

    #[test]
    fn test_session_new() {
        let session = ChatSession::new();
        assert_eq!(session.title, "New Chat");
        assert!(session.is_empty());
        assert!(session.root_message_ids.is_empty());
        assert!(session.current_leaf_id.is_none());
        assert!(session.persona_id.is_none());
    }

    #[test]
    fn test_session_summary() {
        let mut session = ChatSession::new();
        session.title = "Rust questions".to_string();
        let node = MessageNode::new(Role::User, "hi", None, Vec::new());
        session.messages.insert(node.id.clone(), node);

        let summary = session.summary();
        assert_eq!(summary.title, "Rust questions");
        assert_eq!(summary.message_count, 1);
        assert_eq!(summary.id, session.id);
    }

    #[test]
    fn test_session_deserializes_without_root_ids() {
        // Pre-migration payloads lack root_message_ids entirely
        let json = r#"{
            "id": "s1",
            "title": "Old chat",
            "messages": {},
            "current_leaf_id": null,
            "created_at": 1000
        }"#;
        let session: ChatSession = serde_json::from_str(json).unwrap();
        assert!(session.root_message_ids.is_empty());
    }

    #[test]
    fn test_session_serialization_roundtrip() {
        let session = ChatSession::new();
        let json = serde_json::to_string(&session).unwrap();
        let back: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, session.id);
        assert_eq!(back.title, "New Chat");
    }

    // ─── Persona Tests ───────────────────────────────────────

    #[test]
    fn test_generation_config_default() {
        let config = GenerationConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_k, 40);
        assert_eq!(config.top_p, 0.95);
        assert_eq!(config.max_output_tokens, 2048);
    }

    #[test]
    fn test_default_personas() {
        let personas = default_personas();
        assert_eq!(personas.len(), 3);
        assert_eq!(personas[0].id, "default");
        assert!(personas.iter().all(|p| !p.system_prompt.is_empty()));
        assert!(personas.iter().all(|p| !p.chat_mode));
    }

    #[test]
    fn test_persona_value_equality() {
        let a = default_personas().remove(0);
        let mut b = a.clone();
        assert_eq!(a, b);

        b.config.temperature = 0.9;
        assert_ne!(a, b);
    }

    #[test]
    fn test_persona_chat_mode_defaults_off_in_json() {
        let json = r#"{
            "id": "p1",
            "name": "Test",
            "description": "",
            "system_prompt": "prompt",
            "config": {
                "model": "gemini-2.0-flash",
                "temperature": 0.7,
                "top_k": 40,
                "top_p": 0.95,
                "max_output_tokens": 2048
            }
        }"#;
        let persona: Persona = serde_json::from_str(json).unwrap();
        assert!(!persona.chat_mode);
        assert!(persona.avatar.is_none());
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_model_catalog() {
        assert!(is_known_model("gemini-2.0-flash"));
        assert!(is_known_model("gemini-2.5-pro"));
        assert!(!is_known_model("gemini-1.0-ultra"));
        assert!(is_known_model(DEFAULT_MODEL));
    }

    #[test]
    fn test_model_display_name() {
        assert_eq!(model_display_name("gemini-2.5-pro"), "Gemini 2.5 Pro");
        // Unknown ids fall back to the raw id
        assert_eq!(model_display_name("mystery"), "mystery");
    }

    #[test]
    fn test_model_context_limit() {
        assert_eq!(model_context_limit("gemini-2.5-pro"), Some(2_097_152));
        assert_eq!(model_context_limit("nano-banana-pro-preview"), Some(32_768));
        assert_eq!(model_context_limit("mystery"), None);
    }

    #[test]
    fn test_app_settings_default() {
        let settings = AppSettings::default();
        assert!(settings.api_key.is_empty());
        assert_eq!(settings.storage, StorageBackendType::Auto);
    }

    #[test]
    fn test_app_settings_roundtrip() {
        let settings = AppSettings {
            api_key: "AIza-test".to_string(),
            storage: StorageBackendType::IndexedDb,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    // ─── Event Tests ─────────────────────────────────────────

    #[test]
    fn test_chat_event_serialization() {
        let event = ChatEvent::GenerationStarted {
            session_id: "s1".to_string(),
            node_id: "n1".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("GenerationStarted"));
        assert!(json.contains("n1"));
    }

    #[test]
    fn test_chat_event_usage_roundtrip() {
        let event = ChatEvent::UsageReported {
            model: "gemini-2.0-flash".to_string(),
            input_tokens: 120,
            output_tokens: 48,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ChatEvent = serde_json::from_str(&json).unwrap();
        if let ChatEvent::UsageReported {
            input_tokens,
            output_tokens,
            ..
        } = back
        {
            assert_eq!(input_tokens, 120);
            assert_eq!(output_tokens, 48);
        } else {
            panic!("Wrong variant");
        }
    }

    // ─── Usage Tests ─────────────────────────────────────────

    #[test]
    fn test_usage_tracker_record() {
        let mut tracker = UsageTracker::new();
        tracker.record("gemini-2.0-flash", 100, 50);
        tracker.record("gemini-2.0-flash", 10, 5);
        tracker.record("gemini-2.5-pro", 1, 1);

        let flash = tracker.per_model.get("gemini-2.0-flash").unwrap();
        assert_eq!(flash.input_tokens, 110);
        assert_eq!(flash.output_tokens, 55);
        assert_eq!(flash.calls, 2);
        assert_eq!(tracker.total_tokens(), 167);
    }

    #[test]
    fn test_usage_tracker_roundtrip() {
        let mut tracker = UsageTracker::new();
        tracker.record("gemini-2.0-flash", 7, 3);
        let json = serde_json::to_string(&tracker).unwrap();
        let back: UsageTracker = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_tokens(), 10);
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = ChatError::Auth("key rejected".to_string());
        assert_eq!(err.to_string(), "Auth error: key rejected");

        let err = ChatError::Provider("rate limit".to_string());
        assert_eq!(err.to_string(), "Provider error: rate limit");

        let err = ChatError::Cancelled;
        assert_eq!(err.to_string(), "Cancelled");
    }

    #[test]
    fn test_error_is_auth() {
        assert!(ChatError::Auth("x".to_string()).is_auth());
        assert!(!ChatError::Network("x".to_string()).is_auth());
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{{bad}}").unwrap_err();
        let err: ChatError = serde_err.into();
        assert!(matches!(err, ChatError::Serialization(_)));
    }
}
