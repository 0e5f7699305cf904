//! Error types for the document engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    /// The CRDT backend rejected an operation or a payload
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    /// JSON input could not be parsed or produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Referenced node does not exist in the tree
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Insert targeted an id that is already present
    #[error("Node already exists: {0}")]
    DuplicateNode(String),

    /// Action is structurally invalid
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Meta field could not be written
    #[error("Invalid meta field {key}: {reason}")]
    InvalidMeta {
        /// Offending meta key
        key: String,
        /// Why the field was rejected
        reason: String,
    },
}

impl EngineError {
    /// Create an invalid action error
    pub fn invalid_action(msg: impl Into<String>) -> Self {
        Self::InvalidAction(msg.into())
    }

    /// Create an invalid meta field error
    pub fn invalid_meta(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMeta {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
