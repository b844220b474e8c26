use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;

/// Sampling parameters sent with every generation request.
/// `PartialEq` drives the settings panel's dirty check: the draft is
/// compared field-by-field against the stored value, no deep cloning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

/// A named assistant configuration: system prompt plus sampling params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar: Option<String>,
    pub config: GenerationConfig,
    /// When set, model replies are delivered as a sequence of short
    /// bubbles split at sentence boundaries instead of one message.
    #[serde(default)]
    pub chat_mode: bool,
}

impl Persona {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            system_prompt: system_prompt.into(),
            avatar: None,
            config: GenerationConfig::default(),
            chat_mode: false,
        }
    }
}

/// The personas shipped with a fresh install.
pub fn default_personas() -> Vec<Persona> {
    vec![
        Persona {
            id: "default".to_string(),
            name: "Default Assistant".to_string(),
            description: "Standard helpful assistant".to_string(),
            system_prompt: "You are a helpful AI assistant.".to_string(),
            avatar: Some("🤖".to_string()),
            config: GenerationConfig::default(),
            chat_mode: false,
        },
        Persona {
            id: "coder".to_string(),
            name: "Code Guru".to_string(),
            description: "Expert in software development".to_string(),
            system_prompt: "You are an expert software developer. You write clean, \
                            efficient, and well-documented code."
                .to_string(),
            avatar: Some("💻".to_string()),
            config: GenerationConfig {
                temperature: 0.1,
                ..GenerationConfig::default()
            },
            chat_mode: false,
        },
        Persona {
            id: "creative".to_string(),
            name: "Creative Writer".to_string(),
            description: "Imaginative storyteller".to_string(),
            system_prompt: "You are a creative writer. You use vivid imagery and \
                            engaging narratives."
                .to_string(),
            avatar: Some("🎨".to_string()),
            config: GenerationConfig {
                temperature: 1.0,
                top_k: 60,
                ..GenerationConfig::default()
            },
            chat_mode: false,
        },
    ]
}
