//! Key names of the document layout

/// Root key of the node tree map
pub const BLOCKS: &str = "blocks";

/// Root key of the meta store map
pub const META: &str = "meta";

/// Root key holding the editor's root node id
pub const ROOT_ID: &str = "rootId";

// Node fields
pub(crate) const NODE_ID: &str = "id";
pub(crate) const NODE_TYPE: &str = "type";
pub(crate) const NODE_PARENT: &str = "parentId";
pub(crate) const NODE_CHILDREN: &str = "children";
pub(crate) const NODE_DATA: &str = "data";
