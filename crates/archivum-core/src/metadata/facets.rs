//! Grouping of flattened keys for filter pickers.

use crate::config::DEFAULT_GROUP_LABEL;
use serde::{Deserialize, Serialize};

/// One selectable key, possibly backed by several dotted paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOption {
    /// Significant name (last path segment)
    pub label: String,
    /// Every flattened key consolidated into this option
    pub keys: Vec<String>,
}

/// Options sharing a group path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGroup {
    /// Last segment of the group path, or "General" at the top level
    pub label: String,
    /// Dotted path of the parent object (empty at the top level)
    pub path: String,
    pub options: Vec<KeyOption>,
}

struct ParsedKey<'a> {
    name: &'a str,
    group_path: &'a str,
    group_label: &'a str,
}

fn parse_key(key: &str) -> ParsedKey<'_> {
    match key.rsplit_once('.') {
        Some((group_path, name)) => ParsedKey {
            name,
            group_path,
            group_label: group_path.rsplit('.').next().unwrap_or(group_path),
        },
        None => ParsedKey {
            name: key,
            group_path: "",
            group_label: DEFAULT_GROUP_LABEL,
        },
    }
}

/// Arranges flattened keys into labeled groups for a select control.
///
/// Keys sharing both group label and significant name collapse into one
/// option, placed in the group of the first such key. Groups are sorted by
/// label; options keep input order.
pub fn group_keys_for_select(keys: &[String]) -> Vec<KeyGroup> {
    let mut groups: Vec<KeyGroup> = Vec::new();

    for key in keys {
        let parsed = parse_key(key);

        let existing = groups.iter_mut().find_map(|g| {
            if g.label != parsed.group_label {
                return None;
            }
            g.options.iter_mut().find(|o| o.label == parsed.name)
        });
        if let Some(option) = existing {
            if !option.keys.contains(key) {
                option.keys.push(key.clone());
            }
            continue;
        }

        let option = KeyOption {
            label: parsed.name.to_string(),
            keys: vec![key.clone()],
        };
        match groups.iter_mut().find(|g| g.path == parsed.group_path) {
            Some(group) => group.options.push(option),
            None => groups.push(KeyGroup {
                label: parsed.group_label.to_string(),
                path: parsed.group_path.to_string(),
                options: vec![option],
            }),
        }
    }

    groups.sort_by(|a, b| a.label.cmp(&b.label));
    groups
}
