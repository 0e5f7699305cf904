//! # Collab Document - Serialized Document Access
//!
//! A [`DocumentHandle`] owns one document engine and hands it out to
//! concurrent callers one at a time. Local edits, periodic persistence and
//! incoming sync updates can all target the same handle; their effects are
//! applied in gate-acquisition order and never interleave.
//!
//! ## Result Shapes
//!
//! - **optional**: `Option<Update>`. `None` means "nothing to persist",
//!   whether the engine produced no change or failed.
//! - **disjoint**: `Result<T, DocumentError>` with a `Rejected` error the
//!   caller can recover from.
//! - **fatal**: `Result<T, DocumentError>` with a `Fatal` error; the
//!   document itself is unavailable.
//!
//! `merge_updates` is the only operation that skips the gate. It never
//! reads or writes handle state.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod handle;
pub mod logging;
pub mod outcome;

pub use config::DocumentConfig;
pub use error::{DocumentError, DocumentResult};
pub use gate::{Gate, GateGuard};
pub use handle::DocumentHandle;
pub use outcome::Outcome;

pub use collab_engine::{
    ActionKind, AutomergeEngine, Block, DocumentEngine, DocumentState, EngineError, EngineResult,
    MetaValue, NodeAction, NodePayload, Update,
};
