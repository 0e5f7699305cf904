//! Shared document handle
//!
//! Every operation except [`DocumentHandle::merge_updates`] enters the
//! handle's [`Gate`], runs one engine call and leaves. The guard lives only
//! for the synchronous engine call, so no await point exists while it is
//! held.

use std::sync::Arc;

use collab_engine::{
    AutomergeEngine, DocumentEngine, DocumentState, EngineResult, MetaValue, NodeAction, Update,
};

use crate::config::DocumentConfig;
use crate::error::{DocumentError, DocumentResult};
use crate::gate::Gate;
use crate::logging::event;
use crate::outcome::{self, Outcome};

/// Cloneable handle to one document; clones share the same gate and engine
pub struct DocumentHandle<E = AutomergeEngine> {
    shared: Arc<Shared<E>>,
}

struct Shared<E> {
    config: DocumentConfig,
    gate: Gate<E>,
}

impl<E> Clone for DocumentHandle<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E> std::fmt::Debug for DocumentHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("doc_id", &self.shared.config.doc_id)
            .field("locked", &self.shared.gate.is_locked())
            .finish()
    }
}

impl DocumentHandle<AutomergeEngine> {
    /// Handle over a fresh automerge document with default configuration
    pub async fn new() -> DocumentResult<Self> {
        Self::create(DocumentConfig::default()).await
    }
}

impl<E: DocumentEngine> DocumentHandle<E> {
    /// Handle over a freshly created engine
    pub async fn create(config: DocumentConfig) -> DocumentResult<Self> {
        let engine = outcome::fatal("create", E::create()).map_err(|err| {
            event!(error, doc_id = %config.doc_id, error = %err, "Engine initialization failed");
            err
        })?;
        Ok(Self::from_engine(config, engine))
    }

    /// Handle over an existing engine instance
    pub fn from_engine(config: DocumentConfig, engine: E) -> Self {
        event!(debug, doc_id = %config.doc_id, "Document handle created");
        Self {
            shared: Arc::new(Shared {
                config,
                gate: Gate::new(engine),
            }),
        }
    }

    /// Label used in log events
    pub fn doc_id(&self) -> &str {
        &self.shared.config.doc_id
    }

    /// Whether an operation currently holds the gate. Advisory only.
    pub fn is_locked(&self) -> bool {
        self.shared.gate.is_locked()
    }

    /// Operations queued for the gate. Advisory only.
    pub fn waiters(&self) -> usize {
        self.shared.gate.waiters()
    }

    /// Apply an ordered batch of node actions
    pub async fn apply_action(&self, actions: &[NodeAction]) -> Option<Update> {
        self.optional("apply_action", |engine| engine.apply_actions(actions)).await
    }

    /// Record the editor's root node id
    pub async fn set_root_node_id(&self, id: &str) -> Option<Update> {
        self.optional("set_root_node_id", |engine| engine.set_root_node_id(id)).await
    }

    /// Merge remote or persisted updates into the document
    pub async fn apply_updates(&self, updates: &[Update]) -> DocumentResult<()> {
        self.disjoint("apply_updates", |engine| engine.apply_updates(updates)).await
    }

    /// Snapshot of the node tree, root id and meta store
    pub async fn get_document_state(&self) -> DocumentResult<DocumentState> {
        self.fatal("get_document_state", |engine| engine.document_state()).await
    }

    /// Create the document skeleton and return the full encoded state
    pub async fn init_empty_doc(&self) -> DocumentResult<Update> {
        self.fatal("init_empty_doc", |engine| engine.init_empty()).await
    }

    /// Encode the full document for persistence
    pub async fn encode_full_state(&self) -> DocumentResult<Update> {
        self.fatal("encode_full_state", |engine| engine.encode_full_state()).await
    }

    /// Replace the document with one rebuilt from persisted updates
    pub async fn reload_from_updates(&self, updates: &[Update]) -> DocumentResult<()> {
        self.fatal("reload_from_updates", |engine| engine.reload_from_updates(updates)).await
    }

    /// Combine updates into one without touching the handle's document
    ///
    /// Runs without the gate and may overlap any other call, including
    /// itself.
    pub fn merge_updates(&self, updates: &[Update]) -> DocumentResult<Update> {
        outcome::fatal("merge_updates", E::merge_updates(updates)).map_err(|err| {
            self.report_fatal(&err);
            err
        })
    }

    /// Meta store as a JSON object string
    pub async fn get_all_meta(&self) -> DocumentResult<String> {
        self.disjoint("get_all_meta", |engine| engine.meta_json()).await
    }

    /// Set a string meta field
    pub async fn set_meta_string(&self, key: &str, value: &str) -> Option<Update> {
        self.set_meta("set_meta_string", key, MetaValue::from(value)).await
    }

    /// Set an integer meta field
    pub async fn set_meta_int(&self, key: &str, value: i64) -> Option<Update> {
        self.set_meta("set_meta_int", key, MetaValue::Int(value)).await
    }

    /// Set a boolean meta field
    pub async fn set_meta_bool(&self, key: &str, value: bool) -> Option<Update> {
        self.set_meta("set_meta_bool", key, MetaValue::Bool(value)).await
    }

    /// Replace a string-array meta field
    pub async fn set_meta_string_array(&self, key: &str, values: Vec<String>) -> Option<Update> {
        self.set_meta("set_meta_string_array", key, MetaValue::StringArray(values)).await
    }

    /// Append to a string-array meta field; repeated values are ignored
    pub async fn push_meta_array_item(&self, key: &str, value: &str) -> Option<Update> {
        self.optional("push_meta_array_item", |engine| engine.push_meta_item(key, value)).await
    }

    /// Remove a value from a string-array meta field
    pub async fn remove_meta_array_item(&self, key: &str, value: &str) -> Option<Update> {
        self.optional("remove_meta_array_item", |engine| engine.remove_meta_item(key, value)).await
    }

    /// Remove a meta field
    pub async fn remove_meta_key(&self, key: &str) -> Option<Update> {
        self.optional("remove_meta_key", |engine| engine.remove_meta_key(key)).await
    }

    /// Write several meta fields from a JSON object
    ///
    /// Each field's JSON kind picks the setter. One unsupported field fails
    /// the whole call and nothing is written.
    pub async fn set_meta_from_json(&self, json: &str) -> Option<Update> {
        self.optional("set_meta_from_json", |engine| engine.set_meta_from_json(json)).await
    }

    async fn set_meta(
        &self,
        operation: &'static str,
        key: &str,
        value: MetaValue,
    ) -> Option<Update> {
        self.optional(operation, |engine| engine.set_meta(key, value)).await
    }

    async fn run<T, F>(&self, call: F) -> EngineResult<T>
    where
        F: FnOnce(&mut E) -> EngineResult<T>,
    {
        let mut engine = self.shared.gate.enter().await;
        call(&mut engine)
    }

    async fn optional<F>(&self, operation: &'static str, call: F) -> Option<Update>
    where
        F: FnOnce(&mut E) -> EngineResult<Update>,
    {
        match Outcome::classify(self.run(call).await) {
            Outcome::Present(update) => Some(update),
            Outcome::Absent => {
                event!(trace, doc_id = %self.doc_id(), operation, "No changes to persist");
                None
            }
            Outcome::Failed(err) => {
                event!(warn, doc_id = %self.doc_id(), operation, error = %err, "Document operation failed");
                None
            }
        }
    }

    async fn disjoint<T, F>(&self, operation: &'static str, call: F) -> DocumentResult<T>
    where
        F: FnOnce(&mut E) -> EngineResult<T>,
    {
        outcome::disjoint(operation, self.run(call).await).map_err(|err| {
            let error = err.engine_error();
            event!(warn, doc_id = %self.doc_id(), operation, error = %error, "Document operation rejected");
            err
        })
    }

    async fn fatal<T, F>(&self, operation: &'static str, call: F) -> DocumentResult<T>
    where
        F: FnOnce(&mut E) -> EngineResult<T>,
    {
        outcome::fatal(operation, self.run(call).await).map_err(|err| {
            self.report_fatal(&err);
            err
        })
    }

    fn report_fatal(&self, err: &DocumentError) {
        let operation = err.operation();
        let error = err.engine_error();
        event!(error, doc_id = %self.doc_id(), operation, error = %error, "Document unavailable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_engine::NodePayload;

    #[tokio::test]
    async fn clones_share_one_document() {
        let handle = DocumentHandle::new().await.unwrap();
        let other = handle.clone();
        handle.init_empty_doc().await.unwrap();

        other.set_meta_bool("pinned", true).await.unwrap();
        assert_eq!(handle.get_all_meta().await.unwrap(), r#"{"pinned":true}"#);
        assert_eq!(handle.doc_id(), "document");
    }

    #[tokio::test]
    async fn gate_is_free_between_calls() {
        let config = DocumentConfig::default().with_doc_id("n1");
        let handle = DocumentHandle::<AutomergeEngine>::create(config).await.unwrap();
        handle.init_empty_doc().await.unwrap();
        assert!(handle.apply_action(&[NodeAction::delete("ghost")]).await.is_none());
        assert!(!handle.is_locked());
        assert_eq!(handle.waiters(), 0);

        let page = NodeAction::insert(NodePayload::new("page").with_type("page"));
        assert!(handle.apply_action(&[page]).await.is_some());
        assert!(!handle.is_locked());
    }
}
