//! Command implementations.
//!
//! Each command spawns an index worker, initializes it from the resolved
//! [`IndexConfig`], runs, and shuts the worker down so the index file is
//! released before the process exits.

use crate::output::{Report, RetrievedDocument, SearchHit};
use anyhow::{Context, Result};
use archivum_core::config::IndexConfig;
use archivum_core::index::{DocId, ReindexProgress};
use archivum_core::metadata::{group_keys_for_select, Filter};
use archivum_core::retrieval::{HybridRetriever, MetadataCatalog};
use archivum_core::storage::BackingMode;
use archivum_core::worker::{IndexHandle, IndexWorker};
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A running worker for the duration of one command.
struct Session {
    handle: IndexHandle,
    join: JoinHandle<()>,
    backing_mode: BackingMode,
}

impl Session {
    async fn open(config: IndexConfig) -> Result<Self> {
        let (handle, join) = IndexWorker::spawn();
        let backing_mode = handle
            .initialize(config)
            .await
            .context("Failed to initialize semantic index")?;
        if backing_mode == BackingMode::Ephemeral {
            warn!("Index is ephemeral: changes will not survive this process");
        }
        Ok(Self {
            handle,
            join,
            backing_mode,
        })
    }

    async fn close(self) -> Result<()> {
        self.handle.shutdown().await?;
        self.join.await.context("Index worker panicked")?;
        Ok(())
    }
}

/// Reads a JSON array of `{id, text, metadata}` documents.
pub fn load_catalog(path: &Path) -> Result<MetadataCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read documents file: {}", path.display()))?;
    MetadataCatalog::from_json(&json)
        .with_context(|| format!("Invalid documents file: {}", path.display()))
}

/// Rebuilds the index from a documents file.
pub async fn reindex(config: IndexConfig, documents: &Path, show_progress: bool) -> Result<Report> {
    let catalog = load_catalog(documents)?;
    let session = Session::open(config).await?;

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ReindexProgress>();
    let reporter = tokio::spawn(async move {
        while let Some(p) = progress_rx.recv().await {
            info!("Reindex progress: {}/{}", p.indexed_count, p.total_count);
            if show_progress {
                eprintln!(
                    "  {}/{} ({:.0}%)",
                    p.indexed_count,
                    p.total_count,
                    p.percent_complete()
                );
            }
        }
    });

    let result = session
        .handle
        .reindex_all(catalog.index_documents(), Some(progress_tx))
        .await;
    let _ = reporter.await;
    let indexed_count = result.context("Reindex failed")?;

    let backing_mode = session.backing_mode;
    session.close().await?;
    Ok(Report::Reindex {
        indexed_count,
        backing_mode,
    })
}

/// Embeds and stores a single document.
pub async fn ingest(config: IndexConfig, id: u64, text: &str) -> Result<Report> {
    let session = Session::open(config).await?;
    let id = DocId::from_u64(id);
    session
        .handle
        .ingest(id, text)
        .await
        .with_context(|| format!("Failed to ingest document {}", id))?;

    let backing_mode = session.backing_mode;
    session.close().await?;
    Ok(Report::Ingest { id, backing_mode })
}

/// Ranks indexed documents against `query`.
pub async fn search(config: IndexConfig, query: &str) -> Result<Report> {
    let session = Session::open(config).await?;
    let results = session.handle.search(query).await.context("Search failed")?;

    let mut hits = Vec::with_capacity(results.len());
    for result in results {
        let text = session.handle.get_text(result.doc_id).await?;
        hits.push(SearchHit {
            id: result.doc_id,
            score: result.score,
            text,
        });
    }

    session.close().await?;
    Ok(Report::Search {
        query: query.to_string(),
        results: hits,
    })
}

/// Combines metadata filters over a documents file with semantic ranking.
pub async fn retrieve(
    config: IndexConfig,
    documents: &Path,
    filters: &[Filter],
    query: Option<&str>,
) -> Result<Report> {
    let catalog = load_catalog(documents)?;
    let session = Session::open(config).await?;

    let retriever = HybridRetriever::new(session.handle.clone(), catalog);
    let ids = retriever
        .retrieve(filters, query.unwrap_or_default())
        .await
        .context("Retrieval failed")?;

    let (_, catalog) = retriever.into_parts();
    let results = ids
        .into_iter()
        .map(|id| RetrievedDocument {
            id,
            text: catalog.get(id).map(|d| d.text.clone()).unwrap_or_default(),
        })
        .collect();

    session.close().await?;
    Ok(Report::Retrieve {
        query: query.map(str::to_string),
        results,
    })
}

/// Lists the metadata keys available for filtering.
pub fn keys(documents: &Path, grouped: bool) -> Result<Report> {
    let catalog = load_catalog(documents)?;
    let keys = catalog.available_keys();
    if grouped {
        Ok(Report::GroupedKeys {
            groups: group_keys_for_select(&keys),
        })
    } else {
        Ok(Report::Keys { keys })
    }
}

/// Reports index state.
pub async fn stats(config: IndexConfig) -> Result<Report> {
    let session = Session::open(config).await?;
    let stats = session.handle.stats().await?;
    let metrics = session.handle.metrics().await?;
    session.close().await?;
    Ok(Report::Stats { stats, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOCS: &str = r#"[
        {"id": 1, "text": "Invoice from Acme Corp", "metadata": {"Tipo": "Fattura"}},
        {"id": 2, "text": "Lease contract", "metadata": {"Tipo": "Contratto", "sender": {"name": "Immobiliare"}}}
    ]"#;

    fn write_docs(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("documents.json");
        std::fs::write(&path, DOCS).unwrap();
        path
    }

    fn durable(dir: &TempDir) -> IndexConfig {
        IndexConfig::at_path(dir.path().join("semantic_index.redb"))
    }

    #[tokio::test]
    async fn test_reindex_then_search_across_sessions() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir);

        match reindex(durable(&dir), &docs, false).await.unwrap() {
            Report::Reindex {
                indexed_count,
                backing_mode,
            } => {
                assert_eq!(indexed_count, 2);
                assert_eq!(backing_mode, BackingMode::Durable);
            }
            other => panic!("unexpected report {:?}", other),
        }

        match search(durable(&dir), "Acme invoice").await.unwrap() {
            Report::Search { results, .. } => {
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].id, DocId::from_u64(1));
                assert_eq!(results[0].text.as_deref(), Some("Invoice from Acme Corp"));
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieve_with_filter_only() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir);
        let filters = [Filter::new("Tipo", "contr")];

        match retrieve(IndexConfig::ephemeral(), &docs, &filters, None)
            .await
            .unwrap()
        {
            Report::Retrieve { results, .. } => {
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].id, DocId::from_u64(2));
                assert_eq!(results[0].text, "Lease contract");
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_keys_grouped() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir);

        match keys(&docs, false).unwrap() {
            Report::Keys { keys } => assert_eq!(keys, vec!["Tipo", "name", "sender.name"]),
            other => panic!("unexpected report {:?}", other),
        }
        match keys(&docs, true).unwrap() {
            Report::GroupedKeys { groups } => {
                assert_eq!(groups[0].label, "General");
                assert_eq!(groups[1].label, "sender");
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_missing_documents_file() {
        let err = load_catalog(Path::new("/nonexistent/documents.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read documents file"));
    }
}
