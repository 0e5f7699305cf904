//! Error types for the document façade

use collab_engine::EngineError;
use thiserror::Error;

/// Result type for façade operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// Façade error types
///
/// Both variants carry the engine error that caused them and the name of the
/// operation that failed.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The engine refused the call; the document is unchanged and usable
    #[error("{operation} rejected: {source}")]
    Rejected {
        /// Operation that failed
        operation: &'static str,
        /// Underlying engine error
        source: EngineError,
    },

    /// The document could not be produced or read; the session cannot go on
    #[error("{operation} failed fatally: {source}")]
    Fatal {
        /// Operation that failed
        operation: &'static str,
        /// Underlying engine error
        source: EngineError,
    },
}

impl DocumentError {
    /// Create a recoverable error
    pub fn rejected(operation: &'static str, source: EngineError) -> Self {
        Self::Rejected { operation, source }
    }

    /// Create a fatal error
    pub fn fatal(operation: &'static str, source: EngineError) -> Self {
        Self::Fatal { operation, source }
    }

    /// Whether the caller must give up on the document
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Name of the operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Rejected { operation, .. } | Self::Fatal { operation, .. } => operation,
        }
    }

    /// Engine error behind this failure
    pub fn engine_error(&self) -> &EngineError {
        match self {
            Self::Rejected { source, .. } | Self::Fatal { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_names_the_operation() {
        let err = DocumentError::fatal("get_document_state", EngineError::NodeNotFound("b1".into()));
        assert_eq!(
            err.to_string(),
            "get_document_state failed fatally: Node not found: b1"
        );
        assert!(err.is_fatal());
        assert!(err.source().is_some());
    }

    #[test]
    fn rejected_keeps_engine_error() {
        let err = DocumentError::rejected("apply_updates", EngineError::NodeNotFound("b1".into()));
        assert!(!err.is_fatal());
        assert_eq!(err.operation(), "apply_updates");
        assert!(matches!(err.engine_error(), EngineError::NodeNotFound(id) if id == "b1"));
    }
}
