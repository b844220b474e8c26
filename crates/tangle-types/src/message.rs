use serde::{Deserialize, Serialize};

/// Placeholder content for a node reserved before its real content arrives.
/// Renderers hide nodes whose content is empty or still the placeholder.
pub const PLACEHOLDER: &str = "...";

/// Prefix marking a node whose content is an error report rather than
/// model output. Such nodes stay first-class: navigable and copyable.
pub const ERROR_PREFIX: &str = "**Error**: ";

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Kind of attachment payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

/// A file or image attached to a message at creation time.
/// Opaque to the tree logic; `data` is base64 or a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub data: String,
    pub name: String,
}

/// One node in a conversation tree.
///
/// Only `content` is mutable after creation (streaming commits replace it
/// wholesale). `children_ids` is append-only: every branch ever created
/// from this point (the original continuation, edits, regenerations)
/// stays listed in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageNode {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<Attachment>,
    /// Creation time in epoch milliseconds. Used only to order legacy
    /// root nodes during migration.
    pub timestamp: i64,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children_ids: Vec<String>,
}

impl MessageNode {
    pub fn new(
        role: Role,
        content: impl Into<String>,
        parent_id: Option<String>,
        attachments: Vec<Attachment>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            attachments,
            timestamp: chrono::Utc::now().timestamp_millis(),
            parent_id,
            children_ids: Vec::new(),
        }
    }

    /// True while the node holds no displayable content yet.
    pub fn is_placeholder(&self) -> bool {
        let trimmed = self.content.trim();
        trimmed.is_empty() || trimmed == PLACEHOLDER
    }

    /// True if the node carries an error report instead of model output.
    pub fn is_error(&self) -> bool {
        self.content.starts_with(ERROR_PREFIX)
    }

    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
