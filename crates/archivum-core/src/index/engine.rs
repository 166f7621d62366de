// SemanticIndex - embedding, persistence, and linear-scan search

use super::cache::VectorCache;
use super::progress::{ProgressTimer, ReindexProgress};
use super::similarity::{LinearScan, Metric, SearchParams, SimilarityIndex};
use super::types::{validate_dimension, DocId, IndexDocument, IndexStats, SearchResult};
use crate::config::{placeholder_text, IndexConfig, PROGRESS_INTERVAL};
use crate::embedding::{load_provider, EmbeddingProvider};
use crate::error::IndexError;
use crate::metrics::{global_metrics, MetricsSnapshot, PerformanceMetrics};
use crate::storage::{decode_vector, encode_vector, open_store, BackingMode, IndexStore};
use instant::Instant;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Everything that only exists after a successful `initialize()`.
struct Ready {
    provider: Arc<dyn EmbeddingProvider>,
    store: Box<dyn IndexStore>,
    backing_mode: BackingMode,
    /// Fixed for the lifetime of the index
    dimension: usize,
    metric: Metric,
}

/// Semantic index over document text.
///
/// Owns the embedding provider, the index store, and the in-memory vector
/// cache. Not internally synchronized: callers that share one index across
/// tasks go through [`IndexWorker`](crate::worker::IndexWorker), which
/// serializes every operation.
pub struct SemanticIndex {
    ready: Option<Ready>,
    cache: VectorCache,
    scanner: Box<dyn SimilarityIndex>,
    metrics: PerformanceMetrics,
}

impl SemanticIndex {
    /// Creates an uninitialized index recording into the global metrics.
    pub fn new() -> Self {
        Self::with_metrics(global_metrics().clone())
    }

    /// Creates an uninitialized index recording into `metrics`.
    pub fn with_metrics(metrics: PerformanceMetrics) -> Self {
        Self {
            ready: None,
            cache: VectorCache::new(),
            scanner: Box::new(LinearScan),
            metrics,
        }
    }

    /// Replaces the ranking strategy (linear scan by default).
    pub fn with_similarity(mut self, scanner: Box<dyn SimilarityIndex>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Loads the configured provider, opens the store, and hydrates the cache.
    ///
    /// A durable store that cannot be opened degrades to an in-memory one;
    /// the returned [`BackingMode`] reports which was used.
    ///
    /// # Errors
    ///
    /// `EmbeddingFailed` if the provider cannot be loaded, `StorageFailure`
    /// if the store cannot be read. Either leaves the index not ready.
    pub async fn initialize(&mut self, config: &IndexConfig) -> Result<BackingMode, IndexError> {
        self.reset();
        let provider = load_provider(&config.provider)?;
        let (store, backing_mode) = open_store(config.store_path.as_deref());
        self.initialize_with(provider, store, backing_mode).await
    }

    /// Initializes with an already constructed provider and store.
    pub async fn initialize_with(
        &mut self,
        provider: Arc<dyn EmbeddingProvider>,
        store: Box<dyn IndexStore>,
        backing_mode: BackingMode,
    ) -> Result<BackingMode, IndexError> {
        self.reset();
        let dimension = provider.dimension();
        let cache = hydrate(store.as_ref(), dimension).await?;

        info!(
            "Semantic index ready: {} vectors, {}d, provider={}, backing={}",
            cache.len(),
            dimension,
            provider.name(),
            backing_mode
        );

        self.cache = cache;
        self.ready = Some(Ready {
            metric: Metric::for_normalized(provider.is_normalized()),
            provider,
            store,
            backing_mode,
            dimension,
        });
        Ok(backing_mode)
    }

    /// Drops the provider, the store, and every cached vector.
    fn reset(&mut self) {
        self.ready = None;
        self.cache.clear();
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_some()
    }

    /// Durability of the store in use, once initialized.
    pub fn backing_mode(&self) -> Option<BackingMode> {
        self.ready.as_ref().map(|r| r.backing_mode)
    }

    pub fn dimension(&self) -> Option<usize> {
        self.ready.as_ref().map(|r| r.dimension)
    }

    /// Number of vectors in the cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn ready(&self) -> Result<&Ready, IndexError> {
        self.ready.as_ref().ok_or(IndexError::NotReady)
    }

    /// Embeds `text` and stores it under `id`, replacing any prior entry.
    ///
    /// The store is written first; the cache is updated only once both the
    /// text and the vector are durably replaced. A failure at any step
    /// leaves the cache untouched for `id`.
    #[instrument(skip_all, fields(id = %id, text_len = text.len()))]
    pub async fn ingest(&mut self, id: DocId, text: &str) -> Result<(), IndexError> {
        let ready = self.ready()?;

        let embed_start = Instant::now();
        let vector = ready.provider.embed(text).await?;
        let embed_ms = embed_start.elapsed().as_secs_f64() * 1000.0;
        validate_dimension(ready.dimension, vector.len())?;

        let persist_start = Instant::now();
        ready.store.upsert(id, text, &encode_vector(&vector)).await?;
        let persist_ms = persist_start.elapsed().as_secs_f64() * 1000.0;

        self.metrics.record_ingest(embed_ms, persist_ms);
        self.cache.set(id, vector);
        debug!("Indexed document {} ({:.1}ms embed)", id, embed_ms);
        Ok(())
    }

    /// Ranks cached documents by similarity to `query`.
    ///
    /// Returns at most 20 results scoring strictly above 0.25, best first.
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, IndexError> {
        let ready = self.ready()?;

        let embed_start = Instant::now();
        let query_vector = ready.provider.embed(query).await?;
        let embed_ms = embed_start.elapsed().as_secs_f64() * 1000.0;
        validate_dimension(ready.dimension, query_vector.len())?;

        let scan_start = Instant::now();
        let params = SearchParams::new(ready.metric);
        let results = self.scanner.search(&self.cache, &query_vector, &params);
        let scan_ms = scan_start.elapsed().as_secs_f64() * 1000.0;

        self.metrics.record_search(
            embed_ms,
            scan_ms,
            self.cache.len(),
            results.len(),
            results.first().map(|r| r.score),
        );
        debug!(
            "Search scanned {} vectors, {} above threshold",
            self.cache.len(),
            results.len()
        );
        Ok(results)
    }

    /// Clears the index and re-ingests `documents` in order.
    ///
    /// Empty text is indexed as `"Document {id}"`. `on_progress` is called
    /// after every fifth document. On failure the remaining documents are
    /// skipped and those already ingested stay indexed.
    ///
    /// Returns the number of documents indexed.
    #[instrument(skip_all, fields(total = documents.len()))]
    pub async fn reindex_all<F>(
        &mut self,
        documents: &[IndexDocument],
        mut on_progress: F,
    ) -> Result<usize, IndexError>
    where
        F: FnMut(ReindexProgress) + Send,
    {
        let ready = self.ready()?;
        ready.store.clear_all().await?;
        self.cache.clear();

        let timer = ProgressTimer::new();
        let total = documents.len();
        info!("Reindexing {} documents", total);

        for (i, doc) in documents.iter().enumerate() {
            let text = if doc.text.trim().is_empty() {
                placeholder_text(doc.id.as_u64())
            } else {
                doc.text.clone()
            };

            if let Err(e) = self.ingest(doc.id, &text).await {
                warn!(
                    "Reindex aborted at document {} after {}/{} indexed: {}",
                    doc.id, i, total, e
                );
                return Err(e);
            }

            let indexed = i + 1;
            if indexed % PROGRESS_INTERVAL == 0 {
                on_progress(ReindexProgress::new(indexed, total));
            }
        }

        self.metrics.record_reindex(total, timer.elapsed_ms_f64());
        info!("Reindexed {} documents in {}ms", total, timer.elapsed_ms());
        Ok(total)
    }

    /// Returns the text stored for `id`.
    pub async fn get_text(&self, id: DocId) -> Result<Option<String>, IndexError> {
        let ready = self.ready()?;
        Ok(ready.store.get_text(id).await?)
    }

    /// Returns a snapshot of index state. Works before initialization.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            initialized: self.is_ready(),
            document_count: self.cache.len(),
            dimension: self.dimension(),
            backing_mode: self.backing_mode(),
        }
    }

    /// Returns the rolling timing metrics for this index.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Default for SemanticIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuilds the cache from every persisted vector.
///
/// Blobs that do not decode, or decode to the wrong dimension, are skipped.
async fn hydrate(store: &dyn IndexStore, dimension: usize) -> Result<VectorCache, IndexError> {
    let mut cache = VectorCache::new();
    let mut skipped = 0usize;

    for (id, bytes) in store.load_all_vectors().await? {
        match decode_vector(&bytes) {
            Ok(vector) if vector.len() == dimension => cache.set(id, vector),
            Ok(vector) => {
                warn!(
                    "Skipping persisted vector for {}: dimension {} != {}",
                    id,
                    vector.len(),
                    dimension
                );
                skipped += 1;
            }
            Err(e) => {
                warn!("Skipping persisted vector for {}: {}", id, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Hydration skipped {} unreadable vectors", skipped);
    }
    Ok(cache)
}
