//! Exhaustive similarity scan over the vector cache.
//!
//! Every cached vector is scored against the query, candidates at or below
//! the threshold are dropped, and the survivors are ranked by descending
//! score. Sorting is stable, so equal scores keep cache order (ascending id).

use super::cache::VectorCache;
use super::types::SearchResult;
use crate::config::{MAX_SEARCH_RESULTS, SIMILARITY_THRESHOLD};
use std::cmp::Ordering;

/// How to score a candidate against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Plain dot product. Valid only when both vectors are unit length.
    Dot,
    /// Full cosine similarity, for providers that do not normalize.
    Cosine,
}

impl Metric {
    /// Picks the metric matching a provider's normalization guarantee.
    pub fn for_normalized(normalized: bool) -> Self {
        if normalized {
            Metric::Dot
        } else {
            Metric::Cosine
        }
    }

    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Dot => dot_product(a, b),
            Metric::Cosine => cosine_similarity(a, b),
        }
    }
}

/// Parameters for a single ranking pass.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    pub metric: Metric,
    /// Candidates must score strictly above this value
    pub threshold: f32,
    /// Maximum number of results returned
    pub limit: usize,
}

impl SearchParams {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            threshold: SIMILARITY_THRESHOLD,
            limit: MAX_SEARCH_RESULTS,
        }
    }
}

/// Ranking strategy over the cache.
///
/// [`LinearScan`] is the only implementation; the trait exists so an
/// approximate index can replace it without touching the engine.
pub trait SimilarityIndex: Send + Sync {
    fn search(&self, cache: &VectorCache, query: &[f32], params: &SearchParams) -> Vec<SearchResult>;
}

/// O(N * D) scan of every cached vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearScan;

impl SimilarityIndex for LinearScan {
    fn search(&self, cache: &VectorCache, query: &[f32], params: &SearchParams) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = cache
            .entries()
            .filter_map(|(doc_id, vector)| {
                let score = params.metric.score(query, vector);
                (score > params.threshold).then_some(SearchResult { doc_id, score })
            })
            .collect();

        // sort_by is stable: ties keep ascending-id order
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(params.limit);
        results
    }
}

/// Dot product over the common prefix of `a` and `b`.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity. Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
