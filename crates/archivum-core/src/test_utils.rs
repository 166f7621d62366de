//! Test doubles for providers and stores.

use crate::embedding::{EmbeddingProvider, HashingProvider};
use crate::error::EmbeddingError;
use crate::index::DocId;
use crate::storage::{InMemoryIndexStore, IndexStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Small dimension keeps hashing tests fast while still separating words.
pub const TEST_DIM: usize = 256;

pub fn hashing_provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingProvider::new(TEST_DIM).unwrap())
}

/// Provider whose every call fails.
pub struct FailingProvider {
    pub dimension: usize,
}

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::InferenceFailed("provider offline".to_string()))
    }
}

/// Hashing provider that fails for any text containing `marker`.
pub struct FlakyProvider {
    inner: HashingProvider,
    marker: String,
}

impl FlakyProvider {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            inner: HashingProvider::new(TEST_DIM).unwrap(),
            marker: marker.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    fn dimension(&self) -> usize {
        TEST_DIM
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.contains(&self.marker) {
            return Err(EmbeddingError::InferenceFailed(format!(
                "refusing text containing {:?}",
                self.marker
            )));
        }
        Ok(self.inner.embed_sync(text))
    }
}

/// Provider returning fixed vectors per exact text, zeros otherwise.
pub struct StaticProvider {
    pub dimension: usize,
    pub normalized: bool,
    pub vectors: HashMap<String, Vec<f32>>,
}

impl StaticProvider {
    pub fn new(dimension: usize, normalized: bool) -> Self {
        Self {
            dimension,
            normalized,
            vectors: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_normalized(&self) -> bool {
        self.normalized
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimension]))
    }
}

/// In-memory store whose writes can be switched to fail.
#[derive(Default)]
pub struct FailingStore {
    inner: InMemoryIndexStore,
    pub fail_writes: Arc<AtomicBool>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for FailingStore {
    async fn upsert(&self, id: DocId, text: &str, vector: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::IoError("disk full".to_string()));
        }
        self.inner.upsert(id, text, vector).await
    }

    async fn get_text(&self, id: DocId) -> Result<Option<String>, StoreError> {
        self.inner.get_text(id).await
    }

    async fn load_all_vectors(&self) -> Result<Vec<(DocId, Vec<u8>)>, StoreError> {
        self.inner.load_all_vectors().await
    }

    async fn document_count(&self) -> Result<usize, StoreError> {
        self.inner.document_count().await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.inner.clear_all().await
    }
}
