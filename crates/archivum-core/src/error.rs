//! Error types for archivum-core.
//!
//! [`IndexError`] is the engine-level taxonomy surfaced at the boundary:
//! `NotReady`, `EmbeddingFailed`, `StorageFailure`, `Protocol`. Lower layers
//! have their own enums ([`EmbeddingError`], [`StoreError`](crate::storage::StoreError))
//! which convert into it.

use crate::storage::StoreError;
use thiserror::Error;

/// Errors that can occur while producing an embedding.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Provider assets could not be loaded
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    /// Provider is not available (not loaded, unsupported on this build)
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// Failed to tokenize text
    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),
    /// Forward pass or vector construction failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Invalid provider configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors produced by the semantic index and its worker.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// Operation invoked before a successful `initialize()`
    #[error("Index not ready: initialize has not completed")]
    NotReady,
    /// The embedding provider could not produce a vector
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),
    /// Durable storage unavailable or a write failed
    #[error("Storage failure: {0}")]
    StorageFailure(String),
    /// Malformed command payload or closed command channel
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// Vector length does not match the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension fixed at initialization
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },
}

impl IndexError {
    /// Short machine-readable kind, used in boundary error events.
    pub fn kind(&self) -> &'static str {
        match self {
            IndexError::NotReady => "not_ready",
            IndexError::EmbeddingFailed(_) => "embedding_failed",
            IndexError::StorageFailure(_) => "storage_failure",
            IndexError::Protocol(_) => "protocol_error",
            IndexError::DimensionMismatch { .. } => "dimension_mismatch",
        }
    }
}

impl From<EmbeddingError> for IndexError {
    fn from(err: EmbeddingError) -> Self {
        IndexError::EmbeddingFailed(err.to_string())
    }
}

impl From<StoreError> for IndexError {
    fn from(err: StoreError) -> Self {
        IndexError::StorageFailure(err.to_string())
    }
}
