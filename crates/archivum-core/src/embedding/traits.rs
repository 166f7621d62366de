//! Trait for embedding providers.

use crate::error::EmbeddingError;
use async_trait::async_trait;

/// Converts text into a fixed-length vector.
///
/// Implementations must return vectors of exactly [`dimension()`](Self::dimension)
/// elements for every input, for the lifetime of the provider.
///
/// # Normalization
///
/// When [`is_normalized()`](Self::is_normalized) returns `true`, every returned
/// vector has unit L2 norm (or is the zero vector for text with no content).
/// The index relies on this to score candidates with a plain dot product; for
/// providers returning `false` it falls back to full cosine similarity.
///
/// # Examples
///
/// ```ignore
/// let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingProvider::new(384)?);
/// let vector = provider.embed("Invoice from Acme Corp").await?;
/// assert_eq!(vector.len(), provider.dimension());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Output vector dimension.
    fn dimension(&self) -> usize;

    /// Whether output vectors are L2-normalized.
    fn is_normalized(&self) -> bool {
        true
    }

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
