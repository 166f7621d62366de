//! Production configuration constants and index configuration.
//!
//! Constants here define retrieval behavior that callers rely on (relevance
//! threshold, result cap, progress cadence). [`IndexConfig`] is the payload of
//! the `Initialize` command and selects the store location and embedding
//! provider.
//!
//! # Usage
//!
//! ```
//! use archivum_core::config::{IndexConfig, MAX_SEARCH_RESULTS, SIMILARITY_THRESHOLD};
//!
//! let config = IndexConfig::ephemeral();
//! assert!(config.store_path.is_none());
//! assert!(SIMILARITY_THRESHOLD < 1.0);
//! assert_eq!(MAX_SEARCH_RESULTS, 20);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Search
// =============================================================================

/// Minimum similarity a candidate must exceed to be returned.
///
/// Candidates scoring exactly at the threshold are discarded.
pub const SIMILARITY_THRESHOLD: f32 = 0.25;

/// Maximum number of results returned by a single semantic search.
pub const MAX_SEARCH_RESULTS: usize = 20;

/// Free text must be longer than this many characters (after trimming)
/// for the hybrid orchestrator to run a semantic query.
pub const MIN_SEMANTIC_QUERY_CHARS: usize = 2;

// =============================================================================
// Ingestion
// =============================================================================

/// A progress event is emitted after every `PROGRESS_INTERVAL` documents
/// during a bulk reindex.
pub const PROGRESS_INTERVAL: usize = 5;

/// Returns the placeholder text indexed for a document with empty text.
pub fn placeholder_text(id: u64) -> String {
    format!("Document {}", id)
}

// =============================================================================
// Storage
// =============================================================================

/// Default file name of the persistent index.
///
/// Kept separate from the host's metadata database to avoid lock contention.
pub const INDEX_FILENAME: &str = "semantic_index.redb";

// =============================================================================
// Metadata
// =============================================================================

/// Group label used by facet grouping for keys without a parent path.
pub const DEFAULT_GROUP_LABEL: &str = "General";

/// Prefix for positional keys of primitives found in a root-level array.
pub const POSITIONAL_KEY_PREFIX: &str = "item_";

// =============================================================================
// Embedding
// =============================================================================

/// Default dimension of the built-in hashing provider.
pub const HASHING_EMBEDDING_DIM: usize = 384;

// =============================================================================
// Worker
// =============================================================================

/// Capacity of the command queue feeding the index worker.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Embedding provider selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Deterministic feature-hashing bag-of-words embedder.
    Hashing {
        #[serde(default = "default_hashing_dim")]
        dimension: usize,
    },
    /// JinaBERT model loaded from local safetensors + tokenizer files.
    JinaBert {
        model_path: PathBuf,
        tokenizer_path: PathBuf,
    },
}

fn default_hashing_dim() -> usize {
    HASHING_EMBEDDING_DIM
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Hashing {
            dimension: HASHING_EMBEDDING_DIM,
        }
    }
}

/// Configuration for [`SemanticIndex::initialize`](crate::index::SemanticIndex::initialize).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Location of the durable index file. `None` runs fully in memory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// Embedding provider to load.
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl IndexConfig {
    /// Config for a durable index at `path` using the default provider.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: Some(path.into()),
            provider: ProviderConfig::default(),
        }
    }

    /// Config for an in-memory index using the default provider.
    pub fn ephemeral() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }
}
