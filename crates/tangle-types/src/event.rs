use serde::{Deserialize, Serialize};

/// Events emitted by the streaming controller.
/// The UI drains these each frame to update status and trigger repaints;
/// the tree store itself is the source of truth for message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A placeholder node was reserved and streaming is about to begin
    GenerationStarted { session_id: String, node_id: String },

    /// New content was committed to the target node
    Delta { session_id: String, node_id: String },

    /// Chat mode opened a fresh bubble; it is the new stream target
    BubbleOpened { session_id: String, node_id: String },

    /// The stream ended naturally
    GenerationCompleted { session_id: String },

    /// The user stopped the stream; partial content stays as-is
    GenerationCancelled { session_id: String },

    /// The stream failed; the target node now carries an error marker
    GenerationFailed { session_id: String, message: String },

    /// Token counts reported by the provider, forwarded opaquely
    UsageReported {
        model: String,
        input_tokens: u32,
        output_tokens: u32,
    },
}
