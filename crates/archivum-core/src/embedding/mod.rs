//! Embedding provider abstraction and built-in providers.
//!
//! The engine treats embedding generation as an opaque function from text to
//! a fixed-length vector. Any [`EmbeddingProvider`] can be plugged in; two are
//! built in:
//!
//! - [`HashingProvider`] - deterministic feature-hashing bag-of-words vectors,
//!   usable offline and in tests
//! - `JinaBertProvider` - JinaBERT via Candle (requires the `jina` feature)
//!
//! Use [`load_provider`] to build a provider from a [`ProviderConfig`].

mod hashing;
#[cfg(feature = "jina")]
mod jina;
mod traits;

pub use hashing::HashingProvider;
#[cfg(feature = "jina")]
pub use jina::{JinaBertConfig, JinaBertProvider};
pub use traits::EmbeddingProvider;

use crate::config::ProviderConfig;
use crate::error::EmbeddingError;
use std::sync::Arc;
use tracing::info;

/// Builds the embedding provider described by `config`.
///
/// # Errors
///
/// Returns `EmbeddingError::ModelUnavailable` when the requested provider is
/// not compiled into this build, or the provider's own load error.
pub fn load_provider(config: &ProviderConfig) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    match config {
        ProviderConfig::Hashing { dimension } => {
            info!("Using hashing embedding provider ({}d)", dimension);
            Ok(Arc::new(HashingProvider::new(*dimension)?))
        }
        #[cfg(feature = "jina")]
        ProviderConfig::JinaBert {
            model_path,
            tokenizer_path,
        } => {
            let provider =
                JinaBertProvider::from_files(model_path, tokenizer_path, JinaBertConfig::default())?;
            Ok(Arc::new(provider))
        }
        #[cfg(not(feature = "jina"))]
        ProviderConfig::JinaBert { .. } => Err(EmbeddingError::ModelUnavailable(
            "JinaBERT support not compiled in (enable the `jina` feature)".to_string(),
        )),
    }
}

/// Runs synchronous model inference on tokio's blocking pool so the index
/// worker's runtime thread stays free.
#[cfg_attr(not(feature = "jina"), allow(dead_code))]
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, EmbeddingError>
where
    F: FnOnce() -> Result<T, EmbeddingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EmbeddingError::InferenceFailed(format!("Inference task failed: {}", e)))?
}

/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub fn normalize_l2(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
