use crate::config::MIN_SEMANTIC_QUERY_CHARS;
use crate::error::IndexError;
use crate::index::{DocId, SearchResult, SemanticIndex};
use crate::metadata::Filter;
use crate::worker::IndexHandle;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

/// Structured metadata query, answered by the host's document store.
#[async_trait]
pub trait StructuredQuery: Send + Sync {
    /// Ids of documents satisfying `filters`, in the store's order.
    ///
    /// Empty filters select every document.
    async fn query(&self, filters: &[Filter]) -> Result<Vec<DocId>, IndexError>;
}

/// Source of ranked semantic matches.
#[async_trait]
pub trait SemanticSource: Send + Sync {
    async fn semantic_search(&self, query: &str) -> Result<Vec<SearchResult>, IndexError>;
}

#[async_trait]
impl SemanticSource for IndexHandle {
    async fn semantic_search(&self, query: &str) -> Result<Vec<SearchResult>, IndexError> {
        self.search(query).await
    }
}

#[async_trait]
impl SemanticSource for SemanticIndex {
    async fn semantic_search(&self, query: &str) -> Result<Vec<SearchResult>, IndexError> {
        self.search(query).await
    }
}

/// Combines semantic ranking with structured filtering.
pub struct HybridRetriever<S, Q> {
    semantic: S,
    structured: Q,
}

impl<S: SemanticSource, Q: StructuredQuery> HybridRetriever<S, Q> {
    pub fn new(semantic: S, structured: Q) -> Self {
        Self {
            semantic,
            structured,
        }
    }

    /// Consumes the retriever, returning both sources.
    pub fn into_parts(self) -> (S, Q) {
        (self.semantic, self.structured)
    }

    /// Returns matching document ids.
    ///
    /// The semantic query runs only when the trimmed text is longer than two
    /// characters. With both semantic results and active filters the result
    /// is their intersection in semantic order; with only one of them, that
    /// one's order. An index that is not ready yet contributes no semantic
    /// matches rather than an error: active filters alone decide the result,
    /// and without filters the result is empty.
    pub async fn retrieve(
        &self,
        filters: &[Filter],
        free_text: &str,
    ) -> Result<Vec<DocId>, IndexError> {
        let query = free_text.trim();
        let use_semantic = query.chars().count() > MIN_SEMANTIC_QUERY_CHARS;
        let has_filters = filters.iter().any(|f| !f.is_empty());

        if !use_semantic {
            return self.structured.query(filters).await;
        }

        let ranked: Vec<DocId> = match self.semantic.semantic_search(query).await {
            Ok(results) => results.into_iter().map(|r| r.doc_id).collect(),
            Err(IndexError::NotReady) if has_filters => {
                debug!("Semantic index not ready, using filter matches only");
                return self.structured.query(filters).await;
            }
            Err(IndexError::NotReady) => {
                debug!("Semantic index not ready, no semantic candidates");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        if !has_filters {
            return Ok(ranked);
        }

        let allowed: HashSet<DocId> = self.structured.query(filters).await?.into_iter().collect();
        Ok(ranked
            .into_iter()
            .filter(|id| allowed.contains(id))
            .collect())
    }
}
