use serde::{Deserialize, Serialize};

/// Model a persona falls back to when its configured model is no longer
/// in the catalog.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// An entry in the fixed model catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// Context window in tokens.
    pub context_limit: u32,
}

/// The models the client offers. The provider exposes more, but only
/// these are known to work with the playground key flow.
pub const PLAYGROUND_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
        context_limit: 1_048_576,
    },
    ModelInfo {
        id: "gemini-2.5-pro",
        name: "Gemini 2.5 Pro",
        context_limit: 2_097_152,
    },
    ModelInfo {
        id: "gemini-exp-1206",
        name: "Gemini Experimental 1206",
        context_limit: 1_048_576,
    },
    ModelInfo {
        id: "nano-banana-pro-preview",
        name: "Nano Banana Pro",
        context_limit: 32_768,
    },
];

pub fn is_known_model(id: &str) -> bool {
    PLAYGROUND_MODELS.iter().any(|m| m.id == id)
}

pub fn model_display_name(id: &str) -> &str {
    PLAYGROUND_MODELS
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.name)
        .unwrap_or(id)
}

pub fn model_context_limit(id: &str) -> Option<u32> {
    PLAYGROUND_MODELS
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.context_limit)
}

/// Global client settings, persisted across reloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub api_key: String,
    #[serde(default)]
    pub storage: StorageBackendType,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            storage: StorageBackendType::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Pick the best available backend at startup
    #[default]
    Auto,
    Memory,
    IndexedDb,
}
