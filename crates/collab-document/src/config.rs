//! Handle configuration

/// Default label for handles created without an explicit id
pub const DEFAULT_DOC_ID: &str = "document";

/// Per-handle configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Label attached to every log event emitted for the handle
    pub doc_id: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            doc_id: DEFAULT_DOC_ID.to_string(),
        }
    }
}

impl DocumentConfig {
    /// Set the document id
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = doc_id.into();
        self
    }
}
