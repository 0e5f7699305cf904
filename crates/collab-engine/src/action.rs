//! Edit instructions against the node tree
//!
//! Actions are plain serde types so editor commands can hand them across a
//! binding boundary as JSON. A batch is applied in order and atomically.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// What an action does to its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Create a node and link it under its parent
    Insert,
    /// Change a node's type or data fields
    Update,
    /// Remove a node and its whole subtree
    Delete,
    /// Relink a node under a new parent
    Move,
}

/// Node fields carried by an action
///
/// `prev_id` / `next_id` position the node among its siblings: after
/// `prev_id` if it is found, otherwise before `next_id`, otherwise last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePayload {
    /// Node identifier
    pub id: String,
    /// Node type (required on insert)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Parent node; `None` on insert means a top-level node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Sibling the node is placed after
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_id: Option<String>,
    /// Sibling the node is placed before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<String>,
    /// Node properties; `null` values remove the property on update
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub data: JsonMap<String, JsonValue>,
}

impl NodePayload {
    /// Payload for the given node id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the node type
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the parent node
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Place the node after `prev_id`
    pub fn after(mut self, prev_id: impl Into<String>) -> Self {
        self.prev_id = Some(prev_id.into());
        self
    }

    /// Place the node before `next_id`
    pub fn before(mut self, next_id: impl Into<String>) -> Self {
        self.next_id = Some(next_id.into());
        self
    }

    /// Add one data field
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// A single edit to the node tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAction {
    /// Kind of edit
    pub kind: ActionKind,
    /// Target node and its fields
    pub node: NodePayload,
}

impl NodeAction {
    /// Insert `node`
    pub fn insert(node: NodePayload) -> Self {
        Self {
            kind: ActionKind::Insert,
            node,
        }
    }

    /// Update `node`
    pub fn update(node: NodePayload) -> Self {
        Self {
            kind: ActionKind::Update,
            node,
        }
    }

    /// Delete the node with `id`
    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Delete,
            node: NodePayload::new(id),
        }
    }

    /// Move `node` under `node.parent_id`
    pub fn move_to(node: NodePayload) -> Self {
        Self {
            kind: ActionKind::Move,
            node,
        }
    }
}
