//! Deterministic feature-hashing embedding provider.
//!
//! Each lowercased alphanumeric token is hashed (FNV-1a, 64-bit) into one of
//! `dimension` buckets; bucket counts are then L2-normalized. Texts sharing
//! words get a positive dot product proportional to their overlap, which is
//! enough for keyword-flavored similarity without model assets.

use super::normalize_l2;
use super::traits::EmbeddingProvider;
use crate::error::EmbeddingError;
use async_trait::async_trait;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bag-of-words embedder using the hashing trick.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    /// Creates a provider producing `dimension`-length vectors.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::InvalidConfig` if `dimension` is zero.
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "Embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Computes the embedding synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        normalize_l2(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_sync(text))
    }
}

/// Splits text into lowercased alphanumeric tokens.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}
