use crate::storage::BackingMode;
use serde::{Deserialize, Serialize};

/// Document identifier, assigned by the host's metadata store.
///
/// The index never generates ids; it only reacts to the ids handed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(u64);

impl DocId {
    /// Creates a DocId from a raw u64 value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An `(id, text)` pair handed to the index for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: DocId,
    #[serde(default)]
    pub text: String,
}

impl IndexDocument {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id: DocId::from_u64(id),
            text: text.into(),
        }
    }
}

/// A ranked semantic match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching document
    #[serde(rename = "id")]
    pub doc_id: DocId,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Point-in-time view of the index, for hosts and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Whether `initialize()` has completed
    pub initialized: bool,
    /// Number of vectors in the cache
    pub document_count: usize,
    /// Embedding dimension, once known
    pub dimension: Option<usize>,
    /// Durability of the store in use, once opened
    pub backing_mode: Option<BackingMode>,
}

/// Validates that an embedding has the expected dimension.
pub(crate) fn validate_dimension(expected: usize, actual: usize) -> Result<(), crate::IndexError> {
    if expected != actual {
        return Err(crate::IndexError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
