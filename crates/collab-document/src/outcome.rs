//! Classification of engine results into façade result shapes
//!
//! Everything here is pure. Reporting happens in the handle.

use collab_engine::{EngineError, EngineResult, Update};

use crate::error::{DocumentError, DocumentResult};

/// Result of an engine call that produces a delta
#[derive(Debug)]
pub enum Outcome {
    /// The call produced bytes to persist or broadcast
    Present(Update),
    /// The call succeeded but changed nothing
    Absent,
    /// The call failed
    Failed(EngineError),
}

impl Outcome {
    /// Classify an engine result; an empty delta counts as absent
    pub fn classify(result: EngineResult<Update>) -> Self {
        match result {
            Ok(update) if update.is_empty() => Self::Absent,
            Ok(update) => Self::Present(update),
            Err(err) => Self::Failed(err),
        }
    }

    /// Collapse to the optional shape seen by callers
    pub fn into_update(self) -> Option<Update> {
        match self {
            Self::Present(update) => Some(update),
            Self::Absent | Self::Failed(_) => None,
        }
    }

    /// Whether bytes were produced
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Map a failure to a recoverable [`DocumentError::Rejected`]
pub fn disjoint<T>(operation: &'static str, result: EngineResult<T>) -> DocumentResult<T> {
    result.map_err(|err| DocumentError::rejected(operation, err))
}

/// Map a failure to a terminal [`DocumentError::Fatal`]
pub fn fatal<T>(operation: &'static str, result: EngineResult<T>) -> DocumentResult<T> {
    result.map_err(|err| DocumentError::fatal(operation, err))
}
