//! Hybrid retrieval: semantic ranking combined with metadata filters.
//!
//! - `hybrid`: [`HybridRetriever`] and the two source traits it combines
//! - `catalog`: [`MetadataCatalog`], an in-memory [`StructuredQuery`] over
//!   documents loaded from JSON

mod catalog;
mod hybrid;

pub use catalog::{CatalogDocument, MetadataCatalog};
pub use hybrid::{HybridRetriever, SemanticSource, StructuredQuery};
