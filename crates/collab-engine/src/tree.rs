//! Node tree edits
//!
//! Every node lives in the `blocks` map keyed by id. Parent/child links are
//! kept in both directions: `parentId` on the child and the ordered
//! `children` list on the parent. Each operation keeps the two in step.

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc};

use crate::action::{ActionKind, NodeAction, NodePayload};
use crate::error::{EngineError, EngineResult};
use crate::json::{ensure_map, find_list, find_map, position_of, put_json, read_str, read_strings};
use crate::schema::{NODE_CHILDREN, NODE_DATA, NODE_ID, NODE_PARENT, NODE_TYPE};

/// Apply one action to the tree rooted at `blocks`
pub(crate) fn apply(doc: &mut AutoCommit, blocks: &ObjId, action: &NodeAction) -> EngineResult<()> {
    match action.kind {
        ActionKind::Insert => insert(doc, blocks, &action.node),
        ActionKind::Update => update(doc, blocks, &action.node),
        ActionKind::Delete => delete(doc, blocks, &action.node.id),
        ActionKind::Move => move_node(doc, blocks, &action.node),
    }
}

fn insert(doc: &mut AutoCommit, blocks: &ObjId, payload: &NodePayload) -> EngineResult<()> {
    if find_map(doc, blocks, &payload.id)?.is_some() {
        return Err(EngineError::DuplicateNode(payload.id.clone()));
    }
    let kind = payload
        .kind
        .as_deref()
        .ok_or_else(|| EngineError::invalid_action(format!("insert of {} needs a type", payload.id)))?;
    let siblings = match &payload.parent_id {
        Some(parent_id) => Some(children_list(doc, blocks, parent_id)?),
        None => None,
    };

    let node = doc.put_object(blocks, payload.id.as_str(), ObjType::Map)?;
    doc.put(&node, NODE_ID, payload.id.as_str())?;
    doc.put(&node, NODE_TYPE, kind)?;
    if let Some(parent_id) = &payload.parent_id {
        doc.put(&node, NODE_PARENT, parent_id.as_str())?;
    }
    doc.put_object(&node, NODE_CHILDREN, ObjType::List)?;
    let data = doc.put_object(&node, NODE_DATA, ObjType::Map)?;
    for (key, value) in &payload.data {
        put_json(doc, &data, key, value)?;
    }

    if let Some(siblings) = siblings {
        link(doc, &siblings, payload)?;
    }
    Ok(())
}

fn update(doc: &mut AutoCommit, blocks: &ObjId, payload: &NodePayload) -> EngineResult<()> {
    let node = existing_node(doc, blocks, &payload.id)?;
    if let Some(kind) = &payload.kind {
        doc.put(&node, NODE_TYPE, kind.as_str())?;
    }

    let data = ensure_map(doc, &node, NODE_DATA)?;
    for (key, value) in &payload.data {
        if value.is_null() {
            if doc.get(&data, key.as_str())?.is_some() {
                doc.delete(&data, key.as_str())?;
            }
        } else {
            put_json(doc, &data, key, value)?;
        }
    }
    Ok(())
}

fn delete(doc: &mut AutoCommit, blocks: &ObjId, id: &str) -> EngineResult<()> {
    let node = existing_node(doc, blocks, id)?;
    if let Some(parent_id) = read_str(doc, &node, NODE_PARENT)? {
        unlink(doc, blocks, &parent_id, id)?;
    }

    for doomed in subtree(doc, blocks, id)? {
        doc.delete(blocks, doomed.as_str())?;
    }
    Ok(())
}

fn move_node(doc: &mut AutoCommit, blocks: &ObjId, payload: &NodePayload) -> EngineResult<()> {
    let node = existing_node(doc, blocks, &payload.id)?;
    let parent_id = payload
        .parent_id
        .as_deref()
        .ok_or_else(|| EngineError::invalid_action(format!("move of {} needs a parent", payload.id)))?;
    if subtree(doc, blocks, &payload.id)?.iter().any(|id| id == parent_id) {
        return Err(EngineError::invalid_action(format!(
            "cannot move {} under its own subtree ({parent_id})",
            payload.id
        )));
    }
    let siblings = children_list(doc, blocks, parent_id)?;

    if let Some(old_parent) = read_str(doc, &node, NODE_PARENT)? {
        unlink(doc, blocks, &old_parent, &payload.id)?;
    }
    link(doc, &siblings, payload)?;
    doc.put(&node, NODE_PARENT, parent_id)?;
    Ok(())
}

fn existing_node(doc: &AutoCommit, blocks: &ObjId, id: &str) -> EngineResult<ObjId> {
    find_map(doc, blocks, id)?.ok_or_else(|| EngineError::NodeNotFound(id.to_string()))
}

/// Children list of an existing node, created if the node predates it
fn children_list(doc: &mut AutoCommit, blocks: &ObjId, id: &str) -> EngineResult<ObjId> {
    let node = existing_node(doc, blocks, id)?;
    match find_list(doc, &node, NODE_CHILDREN)? {
        Some(list) => Ok(list),
        None => Ok(doc.put_object(&node, NODE_CHILDREN, ObjType::List)?),
    }
}

fn link(doc: &mut AutoCommit, siblings: &ObjId, payload: &NodePayload) -> EngineResult<()> {
    let after_prev = match &payload.prev_id {
        Some(prev) => position_of(doc, siblings, prev)?.map(|index| index + 1),
        None => None,
    };
    let before_next = match &payload.next_id {
        Some(next) => position_of(doc, siblings, next)?,
        None => None,
    };
    let index = after_prev.or(before_next).unwrap_or_else(|| doc.length(siblings));
    doc.insert(siblings, index, payload.id.as_str())?;
    Ok(())
}

fn unlink(doc: &mut AutoCommit, blocks: &ObjId, parent_id: &str, id: &str) -> EngineResult<()> {
    let Some(parent) = find_map(doc, blocks, parent_id)? else {
        return Ok(());
    };
    if let Some(siblings) = find_list(doc, &parent, NODE_CHILDREN)? {
        if let Some(index) = position_of(doc, &siblings, id)? {
            doc.delete(&siblings, index)?;
        }
    }
    Ok(())
}

/// `id` followed by every descendant, depth first
fn subtree(doc: &AutoCommit, blocks: &ObjId, id: &str) -> EngineResult<Vec<String>> {
    let mut found = Vec::new();
    let mut pending = vec![id.to_string()];
    while let Some(current) = pending.pop() {
        if found.contains(&current) {
            continue;
        }
        if let Some(node) = find_map(doc, blocks, &current)? {
            if let Some(children) = find_list(doc, &node, NODE_CHILDREN)? {
                pending.extend(read_strings(doc, &children)?);
            }
        }
        found.push(current);
    }
    Ok(found)
}
