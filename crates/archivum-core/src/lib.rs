//! # Archivum Core
//!
//! Retrieval engine for archived documents. Two complementary modes are
//! supported: semantic similarity over free text, and substring matching
//! over arbitrarily nested document metadata.
//!
//! ## Modules
//!
//! - [`index`] - Vector cache, similarity scan, and the [`SemanticIndex`](index::SemanticIndex)
//! - [`storage`] - Persistent index store (redb) with ephemeral fallback
//! - [`embedding`] - Embedding provider abstraction and built-in providers
//! - [`metadata`] - Metadata flattening, filter matching, and facet grouping
//! - [`retrieval`] - Hybrid orchestration of semantic and structured results
//! - [`worker`] - Single-actor command loop and boundary protocol
//! - [`config`] - Production configuration constants and `IndexConfig`
//! - [`error`] - Error types shared across the engine
//! - [`metrics`] - Rolling timing metrics for ingest and search

pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod metadata;
pub mod metrics;
pub mod retrieval;
pub mod storage;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{EmbeddingError, IndexError};
pub use index::{DocId, SearchResult, SemanticIndex};
