//! # Collab Engine - CRDT Document Store
//!
//! The document engine behind the collaborative editor. It owns the CRDT
//! state of one document (a node tree plus a metadata map) and exposes the
//! construction, mutation and encoding primitives consumed by the
//! concurrency façade in `collab-document`.
//!
//! ## Document Layout
//!
//! - `blocks`: map of node id → node (`type`, `parentId`, `children`, `data`)
//! - `meta`: key → string / integer / boolean / string-array map
//! - `rootId`: identifier of the editor's root node
//!
//! ## Contract
//!
//! An engine instance is correct only under serialized, single-caller
//! access. Every mutation takes `&mut self`; callers that share an engine
//! across tasks must serialize access themselves.

#![forbid(unsafe_code)]

pub mod action;
pub mod engine;
pub mod error;
pub mod meta;
pub mod payload;
pub mod schema;
pub mod state;

mod json;
mod tree;

pub use action::{ActionKind, NodeAction, NodePayload};
pub use engine::{AutomergeEngine, DocumentEngine};
pub use error::{EngineError, EngineResult};
pub use meta::MetaValue;
pub use payload::Update;
pub use state::{Block, DocumentState};
