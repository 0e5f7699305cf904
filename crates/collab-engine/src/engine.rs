//! Document engine boundary and its automerge implementation

use automerge::{transaction::Transactable, AutoCommit, Automerge, ReadDoc, ROOT};

use crate::action::NodeAction;
use crate::error::EngineResult;
use crate::json::ensure_map;
use crate::meta::{self, MetaValue};
use crate::payload::Update;
use crate::schema::{BLOCKS, META, ROOT_ID};
use crate::state::DocumentState;
use crate::tree;

/// Operations a document engine provides to the façade.
///
/// Implementations are correct only under serialized access: every method
/// that touches the document takes `&mut self`. `merge_updates` is the one
/// exception; it is an associated function and cannot observe any instance.
pub trait DocumentEngine: Send + 'static {
    /// Build an engine bound to a fresh, empty document
    fn create() -> EngineResult<Self>
    where
        Self: Sized;

    /// Apply an ordered batch of node actions; all or nothing
    fn apply_actions(&mut self, actions: &[NodeAction]) -> EngineResult<Update>;

    /// Record the editor's root node id
    fn set_root_node_id(&mut self, id: &str) -> EngineResult<Update>;

    /// Merge remote or persisted updates into the live document
    fn apply_updates(&mut self, updates: &[Update]) -> EngineResult<()>;

    /// Replace the live document with one rebuilt from `updates` alone
    fn reload_from_updates(&mut self, updates: &[Update]) -> EngineResult<()>;

    /// Structured snapshot of the document
    fn document_state(&mut self) -> EngineResult<DocumentState>;

    /// Create the document skeleton and return the full encoded state
    fn init_empty(&mut self) -> EngineResult<Update>;

    /// Encode the full document
    fn encode_full_state(&mut self) -> EngineResult<Update>;

    /// Combine updates into one, independent of any document instance.
    ///
    /// The input need not be causally closed: the result loads wherever the
    /// inputs applied one after another would.
    fn merge_updates(updates: &[Update]) -> EngineResult<Update>
    where
        Self: Sized;

    /// Meta store as a JSON object string
    fn meta_json(&mut self) -> EngineResult<String>;

    /// Write one typed meta field
    fn set_meta(&mut self, key: &str, value: MetaValue) -> EngineResult<Update>;

    /// Append to a meta string array unless the value is present
    fn push_meta_item(&mut self, key: &str, value: &str) -> EngineResult<Update>;

    /// Remove a value from a meta string array
    fn remove_meta_item(&mut self, key: &str, value: &str) -> EngineResult<Update>;

    /// Remove a meta field
    fn remove_meta_key(&mut self, key: &str) -> EngineResult<Update>;

    /// Write several meta fields from a JSON object; all or nothing
    fn set_meta_from_json(&mut self, json: &str) -> EngineResult<Update>;
}

/// Document engine backed by an automerge document
#[derive(Debug, Clone)]
pub struct AutomergeEngine {
    doc: AutoCommit,
}

impl AutomergeEngine {
    /// Engine over a fresh, empty document
    pub fn new() -> Self {
        Self {
            doc: AutoCommit::new(),
        }
    }

    /// Run `edit` as one transaction and return the changes it produced.
    ///
    /// A failed edit is rolled back and leaves the document untouched. An
    /// edit that changes nothing yields an empty update.
    fn record<F>(&mut self, edit: F) -> EngineResult<Update>
    where
        F: FnOnce(&mut AutoCommit) -> EngineResult<()>,
    {
        let before = self.doc.get_heads();
        if let Err(err) = edit(&mut self.doc) {
            self.doc.rollback();
            return Err(err);
        }
        if self.doc.pending_ops() == 0 {
            self.doc.rollback();
            return Ok(Update::default());
        }
        self.doc.commit();

        let delta = self
            .doc
            .get_changes(&before)
            .into_iter()
            .flat_map(|change| change.raw_bytes().iter().copied())
            .collect::<Vec<u8>>();
        Ok(Update::new(delta))
    }

    fn load_all(doc: &mut AutoCommit, updates: &[Update]) -> EngineResult<()> {
        for update in updates.iter().filter(|update| !update.is_empty()) {
            doc.load_incremental(update.as_bytes())?;
        }
        Ok(())
    }
}

impl DocumentEngine for AutomergeEngine {
    fn create() -> EngineResult<Self> {
        Ok(Self::new())
    }

    fn apply_actions(&mut self, actions: &[NodeAction]) -> EngineResult<Update> {
        self.record(|doc| {
            let blocks = ensure_map(doc, &ROOT, BLOCKS)?;
            for action in actions {
                tree::apply(doc, &blocks, action)?;
            }
            Ok(())
        })
    }

    fn set_root_node_id(&mut self, id: &str) -> EngineResult<Update> {
        self.record(|doc| {
            doc.put(ROOT, ROOT_ID, id)?;
            Ok(())
        })
    }

    fn apply_updates(&mut self, updates: &[Update]) -> EngineResult<()> {
        let mut staged = self.doc.clone();
        Self::load_all(&mut staged, updates)?;
        self.doc = staged;
        Ok(())
    }

    fn reload_from_updates(&mut self, updates: &[Update]) -> EngineResult<()> {
        let mut rebuilt = AutoCommit::new();
        Self::load_all(&mut rebuilt, updates)?;
        self.doc = rebuilt;
        Ok(())
    }

    fn document_state(&mut self) -> EngineResult<DocumentState> {
        DocumentState::read(&self.doc)
    }

    fn init_empty(&mut self) -> EngineResult<Update> {
        self.record(|doc| {
            ensure_map(doc, &ROOT, BLOCKS)?;
            ensure_map(doc, &ROOT, META)?;
            Ok(())
        })?;
        Ok(Update::new(self.doc.save()))
    }

    fn encode_full_state(&mut self) -> EngineResult<Update> {
        Ok(Update::new(self.doc.save()))
    }

    fn merge_updates(updates: &[Update]) -> EngineResult<Update> {
        let mut scratch = Automerge::new();
        let mut distinct: Vec<&Update> = Vec::new();
        for update in updates.iter().filter(|update| !update.is_empty()) {
            if distinct.contains(&update) {
                continue;
            }
            scratch.load_incremental(update.as_bytes())?;
            distinct.push(update);
        }

        if scratch.get_missing_deps(&[]).is_empty() {
            return Ok(Update::new(scratch.save()));
        }
        // queued changes cannot be re-encoded; pass the input chunks through
        let chunks = distinct
            .into_iter()
            .flat_map(|update| update.as_bytes().iter().copied())
            .collect();
        Ok(Update::new(chunks))
    }

    fn meta_json(&mut self) -> EngineResult<String> {
        meta::to_json(&self.doc)
    }

    fn set_meta(&mut self, key: &str, value: MetaValue) -> EngineResult<Update> {
        self.record(|doc| meta::set(doc, key, &value))
    }

    fn push_meta_item(&mut self, key: &str, value: &str) -> EngineResult<Update> {
        self.record(|doc| meta::push_item(doc, key, value))
    }

    fn remove_meta_item(&mut self, key: &str, value: &str) -> EngineResult<Update> {
        self.record(|doc| meta::remove_item(doc, key, value))
    }

    fn remove_meta_key(&mut self, key: &str) -> EngineResult<Update> {
        self.record(|doc| meta::remove_key(doc, key))
    }

    fn set_meta_from_json(&mut self, json: &str) -> EngineResult<Update> {
        self.record(|doc| meta::set_from_json(doc, json))
    }
}

impl Default for AutomergeEngine {
    fn default() -> Self {
        Self::new()
    }
}
