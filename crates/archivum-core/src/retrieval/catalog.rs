use super::hybrid::StructuredQuery;
use crate::error::IndexError;
use crate::index::{DocId, IndexDocument};
use crate::metadata::{extract_available_keys, filter_list, Filter, HasMetadata};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document record as exported by the host: id, text, and metadata tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub id: DocId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: Value,
}

impl HasMetadata for CatalogDocument {
    fn metadata(&self) -> &Value {
        &self.metadata
    }
}

impl From<&CatalogDocument> for IndexDocument {
    fn from(doc: &CatalogDocument) -> Self {
        IndexDocument {
            id: doc.id,
            text: doc.text.clone(),
        }
    }
}

/// In-memory document list answering structured queries with metadata filters.
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    documents: Vec<CatalogDocument>,
}

impl MetadataCatalog {
    pub fn new(documents: Vec<CatalogDocument>) -> Self {
        Self { documents }
    }

    /// Parses a JSON array of documents.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn documents(&self) -> &[CatalogDocument] {
        &self.documents
    }

    pub fn get(&self, id: DocId) -> Option<&CatalogDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Documents to hand to a full reindex, in catalog order.
    pub fn index_documents(&self) -> Vec<IndexDocument> {
        self.documents.iter().map(IndexDocument::from).collect()
    }

    /// Every flattened metadata key across the catalog, sorted.
    pub fn available_keys(&self) -> Vec<String> {
        extract_available_keys(self.documents.iter().map(|d| &d.metadata))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl StructuredQuery for MetadataCatalog {
    async fn query(&self, filters: &[Filter]) -> Result<Vec<DocId>, IndexError> {
        Ok(filter_list(&self.documents, filters)
            .into_iter()
            .map(|d| d.id)
            .collect())
    }
}
