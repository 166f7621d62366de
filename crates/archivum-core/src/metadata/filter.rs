//! Filter matching over flattened metadata.
//!
//! A [`Filter`] restricts on one key: the document matches when any value
//! under that key contains the filter value, ignoring case. Filters are
//! AND-ed; a filter with an empty key or value is ignored.

use super::flatten::{flatten, FlatMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single `(key, value)` restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub value: String,
}

impl Filter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when this filter does not restrict anything.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() || self.value.is_empty()
    }

    fn matches(&self, flat: &FlatMap) -> bool {
        let needle = self.value.to_lowercase();
        flat.get(&self.key).is_some_and(|values| {
            values
                .iter()
                .any(|v| v.as_text().to_lowercase().contains(&needle))
        })
    }
}

impl std::str::FromStr for Filter {
    type Err = String;

    /// Parses `key=value`. The value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
        Ok(Filter::new(key.trim(), value.trim()))
    }
}

/// Items that carry a metadata tree.
pub trait HasMetadata {
    fn metadata(&self) -> &Value;
}

impl HasMetadata for Value {
    fn metadata(&self) -> &Value {
        self
    }
}

/// Returns true when `flat` satisfies every non-empty filter.
pub fn matches(flat: &FlatMap, filters: &[Filter]) -> bool {
    filters
        .iter()
        .filter(|f| !f.is_empty())
        .all(|f| f.matches(flat))
}

/// Keeps the items whose metadata satisfies `filters`, in input order.
///
/// When every filter is empty all items are returned without flattening.
pub fn filter_list<'a, T: HasMetadata>(items: &'a [T], filters: &[Filter]) -> Vec<&'a T> {
    if filters.iter().all(Filter::is_empty) {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| matches(&flatten(item.metadata()), filters))
        .collect()
}
