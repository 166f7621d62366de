//! Output formatting for command results.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use archivum_core::index::{DocId, IndexStats};
use archivum_core::metadata::KeyGroup;
use archivum_core::metrics::MetricsSnapshot;
use archivum_core::storage::BackingMode;
use serde::Serialize;

/// Maximum characters to show in text snippet
const SNIPPET_MAX_LEN: usize = 200;

/// A ranked semantic match with its indexed text.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub text: Option<String>,
}

/// A document selected by hybrid retrieval.
#[derive(Debug, Serialize)]
pub struct RetrievedDocument {
    pub id: DocId,
    pub text: String,
}

/// Result of one CLI command.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Report {
    Reindex {
        indexed_count: usize,
        backing_mode: BackingMode,
    },
    Ingest {
        id: DocId,
        backing_mode: BackingMode,
    },
    Search {
        query: String,
        results: Vec<SearchHit>,
    },
    Retrieve {
        query: Option<String>,
        results: Vec<RetrievedDocument>,
    },
    Keys {
        keys: Vec<String>,
    },
    GroupedKeys {
        groups: Vec<KeyGroup>,
    },
    Stats {
        stats: IndexStats,
        metrics: MetricsSnapshot,
    },
}

/// Formats a report as pretty-printed JSON.
pub fn format_json(report: &Report) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a report for human-readable terminal output.
pub fn format_human(report: &Report) -> String {
    match report {
        Report::Reindex {
            indexed_count,
            backing_mode,
        } => format!(
            "Indexed {} document{} ({} index)",
            indexed_count,
            plural(*indexed_count),
            backing_mode
        ),
        Report::Ingest { id, backing_mode } => {
            format!("Indexed document {} ({} index)", id, backing_mode)
        }
        Report::Search { query, results } => format_search(query, results),
        Report::Retrieve { query, results } => format_retrieve(query.as_deref(), results),
        Report::Keys { keys } => {
            if keys.is_empty() {
                "No metadata keys found".to_string()
            } else {
                keys.join("\n")
            }
        }
        Report::GroupedKeys { groups } => format_groups(groups),
        Report::Stats { stats, metrics } => format_stats(stats, metrics),
    }
}

fn format_search(query: &str, results: &[SearchHit]) -> String {
    if results.is_empty() {
        return format!("No results found for \"{}\"", query);
    }

    let mut output = format!(
        "Found {} document{} for \"{}\":\n\n",
        results.len(),
        plural(results.len()),
        query
    );
    for (i, hit) in results.iter().enumerate() {
        output.push_str(&format!("{}. #{} (score: {:.2})\n", i + 1, hit.id, hit.score));
        if let Some(text) = &hit.text {
            output.push_str(&format!("   {}\n", truncate_text(text, SNIPPET_MAX_LEN)));
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}

fn format_retrieve(query: Option<&str>, results: &[RetrievedDocument]) -> String {
    if results.is_empty() {
        return "No matching documents".to_string();
    }

    let mut output = match query {
        Some(q) => format!(
            "{} matching document{} for \"{}\":\n\n",
            results.len(),
            plural(results.len()),
            q
        ),
        None => format!(
            "{} matching document{}:\n\n",
            results.len(),
            plural(results.len())
        ),
    };
    for doc in results {
        output.push_str(&format!(
            "#{}  {}\n",
            doc.id,
            truncate_text(&doc.text, SNIPPET_MAX_LEN)
        ));
    }
    output.trim_end().to_string()
}

fn format_groups(groups: &[KeyGroup]) -> String {
    if groups.is_empty() {
        return "No metadata keys found".to_string();
    }

    let mut output = String::new();
    for group in groups {
        if group.path.is_empty() {
            output.push_str(&format!("{}\n", group.label));
        } else {
            output.push_str(&format!("{} ({})\n", group.label, group.path));
        }
        for option in &group.options {
            output.push_str(&format!("  {}  [{}]\n", option.label, option.keys.join(", ")));
        }
    }
    output.trim_end().to_string()
}

fn format_stats(stats: &IndexStats, metrics: &MetricsSnapshot) -> String {
    let mut output = format!(
        "Documents: {}\nDimension: {}\nBacking:   {}\n",
        stats.document_count,
        stats
            .dimension
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        stats
            .backing_mode
            .map(|m| m.to_string())
            .unwrap_or_else(|| "not initialized".to_string()),
    );
    if let Some(avg) = metrics.embedding_avg_ms {
        output.push_str(&format!("Embedding: {:.2}ms avg\n", avg));
    }
    if let Some(avg) = metrics.search.total_latency_avg_ms {
        output.push_str(&format!("Search:    {:.2}ms avg\n", avg));
    }
    output.trim_end().to_string()
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Truncates text to a maximum length, adding ellipsis if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &text[..end];
    match truncated.rfind(' ') {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivum_core::metadata::KeyOption;

    fn hit(id: u64, score: f32, text: &str) -> SearchHit {
        SearchHit {
            id: DocId::from_u64(id),
            score,
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn test_format_search_empty() {
        let report = Report::Search {
            query: "test query".to_string(),
            results: vec![],
        };
        assert!(format_human(&report).contains("No results found"));
    }

    #[test]
    fn test_format_search_single() {
        let report = Report::Search {
            query: "acme".to_string(),
            results: vec![hit(1, 0.85, "Invoice from Acme Corp")],
        };
        let output = format_human(&report);
        assert!(output.contains("1 document for"));
        assert!(output.contains("#1"));
        assert!(output.contains("0.85"));
        assert!(output.contains("Invoice from Acme Corp"));
    }

    #[test]
    fn test_format_json_tagged() {
        let report = Report::Search {
            query: "acme".to_string(),
            results: vec![hit(4, 0.5, "x")],
        };
        let output = format_json(&report);
        assert!(output.contains("\"command\": \"search\""));
        assert!(output.contains("\"id\": 4"));
        assert!(output.contains("\"score\": 0.5"));
    }

    #[test]
    fn test_format_groups() {
        let report = Report::GroupedKeys {
            groups: vec![KeyGroup {
                label: "sender".to_string(),
                path: "header.sender".to_string(),
                options: vec![KeyOption {
                    label: "name".to_string(),
                    keys: vec!["header.sender.name".to_string()],
                }],
            }],
        };
        let output = format_human(&report);
        assert!(output.starts_with("sender (header.sender)"));
        assert!(output.contains("name  [header.sender.name]"));
    }

    #[test]
    fn test_truncate_text() {
        let short = "Short text";
        assert_eq!(truncate_text(short, 50), short);

        let long = "This is a much longer text that should be truncated at a reasonable point";
        let truncated = truncate_text(long, 30);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 33);
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "fattura è già pagata".repeat(20);
        let truncated = truncate_text(&text, 15);
        assert!(truncated.ends_with("..."));
    }
}
