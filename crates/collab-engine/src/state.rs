//! Structured snapshot of a document

use std::collections::BTreeMap;

use automerge::{AutoCommit, ObjId, ReadDoc, ROOT};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::EngineResult;
use crate::json::{find_list, find_map, map_to_json, read_str, read_strings};
use crate::schema::{BLOCKS, META, NODE_CHILDREN, NODE_DATA, NODE_PARENT, NODE_TYPE, ROOT_ID};

/// One node of the tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Node identifier
    pub id: String,
    /// Node type
    #[serde(rename = "type")]
    pub kind: String,
    /// Parent node, `None` for top-level nodes
    pub parent_id: Option<String>,
    /// Ordered child ids
    pub children: Vec<String>,
    /// Node properties
    pub data: JsonMap<String, JsonValue>,
}

/// Full editor-visible state of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    /// Root node id set by the editor
    pub root_id: Option<String>,
    /// All nodes keyed by id
    pub blocks: BTreeMap<String, Block>,
    /// Meta store contents
    pub meta: JsonMap<String, JsonValue>,
}

impl DocumentState {
    /// Read the snapshot out of a document
    pub(crate) fn read(doc: &AutoCommit) -> EngineResult<Self> {
        let mut state = DocumentState {
            root_id: read_str(doc, &ROOT, ROOT_ID)?,
            ..Self::default()
        };

        if let Some(blocks) = find_map(doc, &ROOT, BLOCKS)? {
            let ids: Vec<String> = doc.keys(&blocks).collect();
            for id in ids {
                if let Some(node) = find_map(doc, &blocks, &id)? {
                    let block = read_block(doc, &node, id.clone())?;
                    state.blocks.insert(id, block);
                }
            }
        }

        if let Some(meta) = find_map(doc, &ROOT, META)? {
            state.meta = map_to_json(doc, &meta)?;
        }

        Ok(state)
    }

    /// Children of `id` in order, empty when the node is unknown
    pub fn children_of(&self, id: &str) -> &[String] {
        self.blocks
            .get(id)
            .map(|block| block.children.as_slice())
            .unwrap_or_default()
    }
}

fn read_block(doc: &AutoCommit, node: &ObjId, id: String) -> EngineResult<Block> {
    let children = match find_list(doc, node, NODE_CHILDREN)? {
        Some(list) => read_strings(doc, &list)?,
        None => Vec::new(),
    };
    let data = match find_map(doc, node, NODE_DATA)? {
        Some(map) => map_to_json(doc, &map)?,
        None => JsonMap::new(),
    };

    Ok(Block {
        id,
        kind: read_str(doc, node, NODE_TYPE)?.unwrap_or_default(),
        parent_id: read_str(doc, node, NODE_PARENT)?,
        children,
        data,
    })
}
