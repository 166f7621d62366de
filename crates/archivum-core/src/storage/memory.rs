//! In-memory index store.

use super::{IndexStore, StoreError};
use crate::index::DocId;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
struct Tables {
    fulltext: BTreeMap<u64, String>,
    vectors: BTreeMap<u64, Vec<u8>>,
}

/// Index store that keeps both tables in memory.
///
/// Nothing survives the process. Both tables sit behind one lock so an
/// upsert replaces text and vector together.
#[derive(Default)]
pub struct InMemoryIndexStore {
    tables: RwLock<Tables>,
}

impl InMemoryIndexStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::DatabaseError(format!("Lock poisoned: {}", e))
}

#[async_trait::async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn upsert(&self, id: DocId, text: &str, vector: &[u8]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.fulltext.insert(id.as_u64(), text.to_string());
        tables.vectors.insert(id.as_u64(), vector.to_vec());
        Ok(())
    }

    async fn get_text(&self, id: DocId) -> Result<Option<String>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.fulltext.get(&id.as_u64()).cloned())
    }

    async fn load_all_vectors(&self) -> Result<Vec<(DocId, Vec<u8>)>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .vectors
            .iter()
            .map(|(&id, bytes)| (DocId::from_u64(id), bytes.clone()))
            .collect())
    }

    async fn document_count(&self) -> Result<usize, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.vectors.len())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.fulltext.clear();
        tables.vectors.clear();
        Ok(())
    }
}
