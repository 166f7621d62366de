//! Metadata flattening, filter matching, and facet grouping.
//!
//! Document metadata is an arbitrary JSON tree. [`flatten`] reduces it to a
//! map from key to the primitive values found under that key, indexing each
//! leaf both by its bare name and by its dotted path. Filters then match by
//! either granularity: `{Tipo, fattura}` matches a `Tipo` leaf anywhere in
//! the tree, `{header.Tipo, fattura}` only the one under `header`.

mod facets;
mod filter;
mod flatten;

pub use facets::{group_keys_for_select, KeyGroup, KeyOption};
pub use filter::{filter_list, matches, Filter, HasMetadata};
pub use flatten::{extract_available_keys, flatten, FlatMap, MetadataValue};
