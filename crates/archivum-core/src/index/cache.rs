//! In-memory vector cache.

use super::types::DocId;
use std::collections::BTreeMap;

/// Mapping from document id to embedding, held entirely in memory.
///
/// The cache is the authority for search-time scoring. It is filled in full
/// from the store at startup, written after each confirmed ingest, and
/// emptied in full at the start of a reindex.
///
/// Iteration order is ascending id, which makes tie-breaking between equal
/// scores deterministic.
#[derive(Debug, Default, Clone)]
pub struct VectorCache {
    entries: BTreeMap<DocId, Vec<f32>>,
}

impl VectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the vector for `id`.
    pub fn set(&mut self, id: DocId, vector: Vec<f32>) {
        self.entries.insert(id, vector);
    }

    pub fn get(&self, id: DocId) -> Option<&[f32]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Lazily yields `(id, vector)` pairs reflecting the current state.
    ///
    /// Each call starts a fresh iteration.
    pub fn entries(&self) -> impl Iterator<Item = (DocId, &[f32])> + '_ {
        self.entries.iter().map(|(&id, v)| (id, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
