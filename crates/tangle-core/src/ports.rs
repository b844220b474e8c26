//! Port traits — the hexagonal architecture boundary.
//!
//! Defined here in `tangle-core` (pure Rust); implementations live in
//! `tangle-platform` (browser adapters). The core never imports platform
//! code; it only depends on these traits.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use tangle_types::message::{Attachment, Role};
use tangle_types::persona::GenerationConfig;
use tangle_types::{ChatError, Result};

// ─── Model Port ──────────────────────────────────────────────

/// One entry of the ordered history sent to the model, root-first.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl HistoryEntry {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }
}

/// A generation request: projected history plus sampling parameters.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub history: Vec<HistoryEntry>,
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerateRequest {
    pub fn new(history: Vec<HistoryEntry>, config: &GenerationConfig) -> Self {
        Self {
            history,
            model: config.model.clone(),
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Incremental event from a model response stream.
///
/// The sequence is finite and not restartable: zero or more `Delta`s,
/// optionally a `Usage`, then exactly one `Done` or `Error`.
#[derive(Debug, Clone)]
pub enum ModelStreamEvent {
    /// A partial text increment
    Delta(String),
    /// Token counts, forwarded opaquely to usage accounting
    Usage { input_tokens: u32, output_tokens: u32 },
    /// Stream finished normally
    Done,
    /// Stream failed; no further events follow
    Error(ChatError),
}

#[async_trait(?Send)]
pub trait ModelPort {
    /// Start a streaming generation for the given history.
    fn stream_generate(
        &self,
        req: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = ModelStreamEvent>>>;

    /// List model identifiers available to this credential.
    async fn list_models(&self) -> Result<Vec<String>>;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys with a given prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Pacer Port ──────────────────────────────────────────────

/// Suspends the current task for a given duration. Used for the
/// turn-taking delay between chat-mode bubbles; a timer in the browser,
/// an immediate return in tests.
#[async_trait(?Send)]
pub trait PacerPort {
    async fn pause(&self, ms: u32);
}
