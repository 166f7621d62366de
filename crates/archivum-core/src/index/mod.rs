//! Semantic index: vector cache, similarity scan, and the ingestion/query engine.
//!
//! # Architecture
//!
//! - `types`: Core types (DocId, SearchResult, IndexDocument, IndexStats)
//! - `cache`: In-memory id -> vector map, hydrated from the store at startup
//! - `similarity`: Exhaustive linear scan behind the [`SimilarityIndex`] trait
//! - `progress`: Reindex progress reporting
//! - `engine`: [`SemanticIndex`], which owns provider, store, and cache
//!
//! # Consistency
//!
//! Ingestion persists first and updates the cache only after the durable
//! write succeeds, so after any `ingest` call (successful or not) the cache
//! entry for an id equals the persisted vector for that id.
//!
//! # Usage
//!
//! ```ignore
//! use archivum_core::config::IndexConfig;
//! use archivum_core::index::{DocId, SemanticIndex};
//!
//! let mut index = SemanticIndex::new();
//! index.initialize(&IndexConfig::ephemeral()).await?;
//! index.ingest(DocId::from_u64(1), "Invoice from Acme Corp").await?;
//! let results = index.search("Acme invoice").await?;
//! ```

mod cache;
mod engine;
mod progress;
mod similarity;
mod types;

pub use cache::VectorCache;
pub use engine::SemanticIndex;
pub use progress::{ProgressTimer, ReindexProgress};
pub use similarity::{cosine_similarity, dot_product, LinearScan, Metric, SearchParams, SimilarityIndex};
pub use types::{DocId, IndexDocument, IndexStats, SearchResult};
