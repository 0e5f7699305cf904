//! Opaque binary payloads crossing the engine boundary

use serde::{Deserialize, Serialize};

/// An encoded CRDT payload: a delta, a merged delta or a full document.
///
/// The byte layout is owned by the engine. Nothing outside the engine
/// inspects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Update(#[serde(with = "serde_bytes")] Vec<u8>);

impl Update {
    /// Wrap raw bytes produced by an engine
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take ownership of the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encoded size in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the operation that produced this payload changed nothing
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Update {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<Update> for Vec<u8> {
    fn from(update: Update) -> Self {
        update.0
    }
}

impl AsRef<[u8]> for Update {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
