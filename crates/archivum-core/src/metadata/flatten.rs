use crate::config::POSITIONAL_KEY_PREFIX;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A primitive leaf of a metadata tree.
///
/// JSON `null` is not a leaf and never appears in a [`FlatMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Number(Number),
    Boolean(bool),
}

impl MetadataValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(MetadataValue::String(s.clone())),
            Value::Number(n) => Some(MetadataValue::Number(n.clone())),
            Value::Bool(b) => Some(MetadataValue::Boolean(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Textual form used for substring matching.
    pub fn as_text(&self) -> String {
        match self {
            MetadataValue::String(s) => s.clone(),
            MetadataValue::Number(n) => n.to_string(),
            MetadataValue::Boolean(b) => b.to_string(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::Number(n.into())
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Boolean(b)
    }
}

/// Key (bare leaf name or dotted path) to every primitive found under it,
/// in encounter order.
pub type FlatMap = BTreeMap<String, Vec<MetadataValue>>;

/// Flattens a metadata tree.
///
/// For an object member `k` with cleaned name `k'` under path `P`:
/// - a primitive is recorded under `k'` and, when different, under `P.k'`
/// - an object is descended with path `P.k'`
/// - an array contributes its primitives under `k'`/`P.k'`; nested objects
///   and arrays inside it are descended at `P` itself
///
/// An array at the root keys its primitives as `item_<index>`. A bare
/// primitive at the root is treated as a one-element array.
pub fn flatten(metadata: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    walk(metadata, "", &mut out);
    out
}

fn walk(node: &Value, path: &str, out: &mut FlatMap) {
    match node {
        Value::Object(map) => walk_object(map, path, out),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Object(_) | Value::Array(_) => walk(item, path, out),
                    leaf => {
                        if let Some(value) = MetadataValue::from_json(leaf) {
                            let key = if path.is_empty() {
                                format!("{}{}", POSITIONAL_KEY_PREFIX, i)
                            } else {
                                path.to_string()
                            };
                            out.entry(key).or_default().push(value);
                        }
                    }
                }
            }
        }
        leaf => {
            if let Some(value) = MetadataValue::from_json(leaf) {
                let key = if path.is_empty() {
                    format!("{}0", POSITIONAL_KEY_PREFIX)
                } else {
                    path.to_string()
                };
                out.entry(key).or_default().push(value);
            }
        }
    }
}

fn walk_object(map: &Map<String, Value>, path: &str, out: &mut FlatMap) {
    for (raw_key, child) in map {
        let name = clean_key(raw_key);
        let full_path = if path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", path, name)
        };

        match child {
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(_) | Value::Array(_) => walk(item, path, out),
                        leaf => record(out, name, &full_path, leaf),
                    }
                }
            }
            Value::Object(inner) => walk_object(inner, &full_path, out),
            leaf => record(out, name, &full_path, leaf),
        }
    }
}

fn record(out: &mut FlatMap, name: &str, full_path: &str, leaf: &Value) {
    let Some(value) = MetadataValue::from_json(leaf) else {
        return;
    };
    if full_path != name {
        out.entry(full_path.to_string())
            .or_default()
            .push(value.clone());
    }
    out.entry(name.to_string()).or_default().push(value);
}

/// Strips one leading attribute marker from a key: `@_` (XML attribute
/// prefix of common XML-to-JSON converters), else `@` or `$`.
fn clean_key(key: &str) -> &str {
    let stripped = key
        .strip_prefix("@_")
        .or_else(|| key.strip_prefix(['@', '$']));
    match stripped {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => key,
    }
}

/// Union of the flattened keys of every metadata tree, sorted and deduplicated.
pub fn extract_available_keys<'a, I>(metadata: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    metadata
        .into_iter()
        .flat_map(|m| flatten(m).into_keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
