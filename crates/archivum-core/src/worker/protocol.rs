//! Boundary commands and events.
//!
//! Both serialize as internally tagged JSON objects, one per line:
//!
//! ```text
//! {"type":"ingest_document","id":1,"text":"Invoice from Acme Corp"}
//! {"type":"ingested","id":1}
//! ```

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::index::{DocId, IndexDocument, IndexStats, ReindexProgress, SearchResult};
use crate::storage::BackingMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors at the command boundary.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// Inbound payload is not a valid command
    #[error("Malformed command: {0}")]
    Malformed(String),
    /// Outbound event could not be serialized
    #[error("Failed to encode event: {0}")]
    Encode(String),
    /// The worker has stopped and no longer accepts commands
    #[error("Index worker is not running")]
    ChannelClosed,
}

impl From<ProtocolError> for IndexError {
    fn from(err: ProtocolError) -> Self {
        IndexError::Protocol(err.to_string())
    }
}

/// Inbound command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Initialize {
        #[serde(default)]
        config: IndexConfig,
    },
    IngestDocument {
        id: DocId,
        #[serde(default)]
        text: String,
    },
    Search {
        query: String,
    },
    ReindexAll {
        documents: Vec<IndexDocument>,
    },
    Stats,
    Shutdown,
}

impl Command {
    /// Wire name of the command, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize { .. } => "initialize",
            Command::IngestDocument { .. } => "ingest_document",
            Command::Search { .. } => "search",
            Command::ReindexAll { .. } => "reindex_all",
            Command::Stats => "stats",
            Command::Shutdown => "shutdown",
        }
    }
}

/// Outbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Initialize succeeded
    Ready { backing_mode: BackingMode },
    /// IngestDocument succeeded
    Ingested { id: DocId },
    /// Search succeeded
    SearchResults { results: Vec<SearchResult> },
    /// Emitted every fifth document during ReindexAll
    ReindexProgress {
        indexed_count: usize,
        total_count: usize,
    },
    /// ReindexAll succeeded
    ReindexComplete { indexed_count: usize },
    Stats { stats: IndexStats },
    /// Any command failed
    Error {
        kind: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<DocId>,
    },
    /// Shutdown acknowledged; no further events follow
    ShuttingDown,
}

impl Event {
    /// Error event for `err`, tagged with the document id when there is one.
    pub fn error(err: &IndexError, id: Option<DocId>) -> Self {
        Event::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
            id,
        }
    }
}

impl From<ReindexProgress> for Event {
    fn from(p: ReindexProgress) -> Self {
        Event::ReindexProgress {
            indexed_count: p.indexed_count,
            total_count: p.total_count,
        }
    }
}

/// Parses one JSON line into a command.
pub fn decode_command(line: &str) -> Result<Command, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Serializes an event as a single JSON line (without the trailing newline).
pub fn encode_event(event: &Event) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(|e| ProtocolError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn test_decode_ingest() {
        let cmd = decode_command(r#"{"type":"ingest_document","id":7,"text":"hello"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::IngestDocument {
                id: DocId::from_u64(7),
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_decode_initialize_defaults() {
        let cmd = decode_command(r#"{"type":"initialize"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Initialize {
                config: IndexConfig::default()
            }
        );

        let cmd = decode_command(
            r#"{"type":"initialize","config":{"store_path":"/tmp/x.redb","provider":{"kind":"hashing","dimension":64}}}"#,
        )
        .unwrap();
        match cmd {
            Command::Initialize { config } => {
                assert_eq!(config.provider, ProviderConfig::Hashing { dimension: 64 });
                assert!(config.store_path.is_some());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_decode_reindex_missing_text() {
        let cmd = decode_command(r#"{"type":"reindex_all","documents":[{"id":1},{"id":2,"text":"b"}]}"#)
            .unwrap();
        match cmd {
            Command::ReindexAll { documents } => {
                assert_eq!(documents[0].text, "");
                assert_eq!(documents[1].text, "b");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode_command("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode_command(r#"{"type":"explode"}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode_command(r#"{"type":"search"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_encode_events() {
        let line = encode_event(&Event::Ingested {
            id: DocId::from_u64(3),
        })
        .unwrap();
        assert_eq!(line, r#"{"type":"ingested","id":3}"#);

        let line = encode_event(&Event::ReindexProgress {
            indexed_count: 5,
            total_count: 12,
        })
        .unwrap();
        assert_eq!(
            line,
            r#"{"type":"reindex_progress","indexed_count":5,"total_count":12}"#
        );

        let line = encode_event(&Event::Ready {
            backing_mode: BackingMode::Ephemeral,
        })
        .unwrap();
        assert_eq!(line, r#"{"type":"ready","backing_mode":"ephemeral"}"#);
    }

    #[test]
    fn test_error_event_carries_kind_and_id() {
        let event = Event::error(&IndexError::NotReady, Some(DocId::from_u64(9)));
        let line = encode_event(&event).unwrap();
        assert!(line.contains(r#""kind":"not_ready""#));
        assert!(line.contains(r#""id":9"#));

        let line = encode_event(&Event::error(&IndexError::NotReady, None)).unwrap();
        assert!(!line.contains("\"id\""));
    }
}
