//! Persistent index store for full-text content and embedding vectors.
//!
//! The store keeps two logical tables keyed by document id:
//!
//! - `fulltext`: id -> UTF-8 content
//! - `vectors`: id -> raw `f32` blob (`dimension * 4` bytes, native byte order)
//!
//! # Implementations
//!
//! - [`RedbIndexStore`] - durable redb file (feature `redb-store`, default)
//! - [`InMemoryIndexStore`] - ephemeral, used for tests and as the degraded
//!   fallback when the durable backing cannot be opened
//!
//! [`open_store`] chooses between them and reports the resulting
//! [`BackingMode`] so callers can observe a silent durability downgrade.

mod memory;
#[cfg(feature = "redb-store")]
mod redb_store;

pub use memory::InMemoryIndexStore;
#[cfg(feature = "redb-store")]
pub use redb_store::RedbIndexStore;

use crate::index::DocId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during index store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error opening or writing the backing file
    #[error("I/O error: {0}")]
    IoError(String),

    /// Vector blob could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Database error (redb transaction, table, commit)
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Durability of the store actually in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackingMode {
    /// Data survives process restarts.
    Durable,
    /// Data lives only in memory for the process lifetime.
    Ephemeral,
}

impl std::fmt::Display for BackingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackingMode::Durable => write!(f, "durable"),
            BackingMode::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

/// Storage backend for the semantic index.
///
/// # Atomicity
///
/// [`upsert`](Self::upsert) writes the full-text entry and the vector entry
/// for one document as a single unit: either both are replaced or neither is.
#[async_trait::async_trait]
pub trait IndexStore: Send + Sync {
    /// Replaces the text and vector blob stored for `id`.
    async fn upsert(&self, id: DocId, text: &str, vector: &[u8]) -> Result<(), StoreError>;

    /// Returns the indexed text for `id`, if any.
    async fn get_text(&self, id: DocId) -> Result<Option<String>, StoreError>;

    /// Returns every `(id, vector blob)` pair in ascending id order.
    ///
    /// Used once at startup to hydrate the vector cache.
    async fn load_all_vectors(&self) -> Result<Vec<(DocId, Vec<u8>)>, StoreError>;

    /// Number of documents with a stored vector.
    async fn document_count(&self) -> Result<usize, StoreError>;

    /// Empties both tables.
    async fn clear_all(&self) -> Result<(), StoreError>;
}

/// Opens the index store for `path`, falling back to memory on failure.
///
/// `None` selects an in-memory store outright. When the durable backing
/// cannot be opened the failure is logged and an [`InMemoryIndexStore`] is
/// returned with [`BackingMode::Ephemeral`] instead of an error.
pub fn open_store(path: Option<&Path>) -> (Box<dyn IndexStore>, BackingMode) {
    let Some(path) = path else {
        info!("No index path configured, using in-memory store");
        return (Box::new(InMemoryIndexStore::new()), BackingMode::Ephemeral);
    };

    #[cfg(feature = "redb-store")]
    {
        match RedbIndexStore::open(path) {
            Ok(store) => {
                info!("Opened index store at {}", path.display());
                (Box::new(store), BackingMode::Durable)
            }
            Err(e) => {
                warn!(
                    "Durable index store unavailable at {} ({}), falling back to in-memory store",
                    path.display(),
                    e
                );
                (Box::new(InMemoryIndexStore::new()), BackingMode::Ephemeral)
            }
        }
    }

    #[cfg(not(feature = "redb-store"))]
    {
        warn!(
            "Durable store support not compiled in, ignoring {} and using in-memory store",
            path.display()
        );
        (Box::new(InMemoryIndexStore::new()), BackingMode::Ephemeral)
    }
}

/// Serializes a vector to raw bytes.
///
/// Format: `f32` values packed sequentially in native byte order, 4 bytes each.
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for &val in vector {
        bytes.extend_from_slice(&val.to_ne_bytes());
    }
    bytes
}

/// Deserializes a vector blob produced by [`encode_vector`].
///
/// # Errors
///
/// Returns `StoreError::SerializationError` if the length is not a multiple of 4.
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::SerializationError(format!(
            "Vector blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
