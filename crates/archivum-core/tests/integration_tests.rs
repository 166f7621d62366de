//! End-to-end tests across index, storage, worker, and retrieval.
//!
//! Everything runs on the hashing provider, so no model files are needed.
//! Run with: `cargo test -p archivum-core --test integration_tests`

use archivum_core::config::{IndexConfig, ProviderConfig, INDEX_FILENAME};
use archivum_core::index::{DocId, IndexDocument, ReindexProgress, SemanticIndex};
use archivum_core::metadata::Filter;
use archivum_core::metrics::PerformanceMetrics;
use archivum_core::retrieval::{HybridRetriever, MetadataCatalog};
use archivum_core::storage::BackingMode;
use archivum_core::worker::{Command, Event, IndexWorker};
use tempfile::TempDir;
use tokio::sync::mpsc;

// ============================================================================
// Helpers
// ============================================================================

fn durable_config(dir: &TempDir) -> IndexConfig {
    IndexConfig::at_path(dir.path().join(INDEX_FILENAME))
}

fn isolated_index() -> SemanticIndex {
    SemanticIndex::with_metrics(PerformanceMetrics::new())
}

const CATALOG: &str = r#"[
    {"id": 3, "text": "Invoice from Acme Corp for office chairs",
     "metadata": {"Tipo": "Fattura elettronica", "sender": {"name": "Acme"}}},
    {"id": 5, "text": "Acme invoice for printer toner",
     "metadata": {"Tipo": "Fattura", "sender": {"name": "Acme"}}},
    {"id": 7, "text": "Lease contract for the Milan office",
     "metadata": {"Tipo": "Contratto", "sender": {"name": "Immobiliare"}}},
    {"id": 9, "text": "Payslip for March",
     "metadata": {"Tipo": "Cedolino"}}
]"#;

// ============================================================================
// Semantic index
// ============================================================================

#[tokio::test]
async fn test_ingest_and_search_durable() {
    let dir = TempDir::new().unwrap();
    let mut index = isolated_index();
    let mode = index.initialize(&durable_config(&dir)).await.unwrap();
    assert_eq!(mode, BackingMode::Durable);

    index
        .ingest(DocId::from_u64(1), "Invoice from Acme Corp")
        .await
        .unwrap();

    let results = index.search("Acme invoice").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, DocId::from_u64(1));
    assert!(results[0].score > 0.25);
}

#[tokio::test]
async fn test_restart_reloads_identical_scores() {
    let dir = TempDir::new().unwrap();
    let config = durable_config(&dir);

    let before = {
        let mut index = isolated_index();
        index.initialize(&config).await.unwrap();
        for (id, text) in [
            (1, "Invoice from Acme Corp"),
            (2, "Acme quarterly invoice summary"),
            (3, "Holiday schedule"),
        ] {
            index.ingest(DocId::from_u64(id), text).await.unwrap();
        }
        index.search("Acme invoice").await.unwrap()
    };

    let mut reopened = isolated_index();
    reopened.initialize(&config).await.unwrap();
    assert_eq!(reopened.len(), 3);

    let after = reopened.search("Acme invoice").await.unwrap();
    assert_eq!(before, after);
    assert_eq!(
        reopened.get_text(DocId::from_u64(3)).await.unwrap().as_deref(),
        Some("Holiday schedule")
    );
}

#[tokio::test]
async fn test_unavailable_store_degrades_to_ephemeral() {
    let dir = TempDir::new().unwrap();
    let config = IndexConfig::at_path(dir.path().join("missing").join(INDEX_FILENAME));

    let mut index = isolated_index();
    let mode = index.initialize(&config).await.unwrap();
    assert_eq!(mode, BackingMode::Ephemeral);
    assert_eq!(index.stats().backing_mode, Some(BackingMode::Ephemeral));

    index.ingest(DocId::from_u64(1), "still works").await.unwrap();
    assert_eq!(index.search("still works").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_provider_is_fatal() {
    let config = IndexConfig::ephemeral().with_provider(ProviderConfig::Hashing { dimension: 0 });
    let mut index = isolated_index();
    assert!(index.initialize(&config).await.is_err());
    assert!(!index.is_ready());
}

#[tokio::test]
async fn test_reindex_replaces_prior_content() {
    let dir = TempDir::new().unwrap();
    let mut index = isolated_index();
    index.initialize(&durable_config(&dir)).await.unwrap();
    index
        .ingest(DocId::from_u64(999), "obsolete memo")
        .await
        .unwrap();

    let docs: Vec<IndexDocument> = (1..=23)
        .map(|i| IndexDocument::new(i, format!("archived record {}", i)))
        .collect();
    let mut progress = Vec::new();
    let count = index
        .reindex_all(&docs, |p| progress.push(p))
        .await
        .unwrap();

    assert_eq!(count, 23);
    assert_eq!(progress.len(), 23 / 5);
    assert_eq!(progress.last(), Some(&ReindexProgress::new(20, 23)));
    assert!(index.search("obsolete memo").await.unwrap().is_empty());
    assert_eq!(index.get_text(DocId::from_u64(999)).await.unwrap(), None);
}

// ============================================================================
// Worker boundary
// ============================================================================

#[tokio::test]
async fn test_worker_boundary_session() {
    let dir = TempDir::new().unwrap();
    let (handle, join) = IndexWorker::spawn_with(isolated_index());
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let commands = vec![
        Command::Search {
            query: "too early".to_string(),
        },
        Command::Initialize {
            config: durable_config(&dir),
        },
        Command::ReindexAll {
            documents: (1..=6)
                .map(|i| IndexDocument::new(i, format!("note {}", i)))
                .collect(),
        },
        Command::Stats,
        Command::Shutdown,
    ];
    for command in commands {
        handle.submit(command, events_tx.clone()).await.unwrap();
    }
    drop(events_tx);

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    join.await.unwrap();

    assert!(matches!(&events[0], Event::Error { kind, .. } if kind == "not_ready"));
    assert_eq!(
        events[1],
        Event::Ready {
            backing_mode: BackingMode::Durable
        }
    );
    assert_eq!(
        events[2],
        Event::ReindexProgress {
            indexed_count: 5,
            total_count: 6
        }
    );
    assert_eq!(events[3], Event::ReindexComplete { indexed_count: 6 });
    match &events[4] {
        Event::Stats { stats } => assert_eq!(stats.document_count, 6),
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(events[5], Event::ShuttingDown);
}

// ============================================================================
// Hybrid retrieval
// ============================================================================

#[tokio::test]
async fn test_hybrid_retrieval_over_catalog() {
    let catalog = MetadataCatalog::from_json(CATALOG).unwrap();
    let (handle, _join) = IndexWorker::spawn_with(isolated_index());
    handle.initialize(IndexConfig::ephemeral()).await.unwrap();
    handle
        .reindex_all(catalog.index_documents(), None)
        .await
        .unwrap();

    let retriever = HybridRetriever::new(handle.clone(), catalog);

    // semantic only
    let ids = retriever.retrieve(&[], "Acme invoice").await.unwrap();
    assert!(ids.contains(&DocId::from_u64(3)));
    assert!(ids.contains(&DocId::from_u64(5)));
    assert!(!ids.contains(&DocId::from_u64(9)));

    // semantic + filter: only invoices from Acme that also match the text
    let filters = [Filter::new("Tipo", "elettronica")];
    let ids = retriever.retrieve(&filters, "Acme invoice").await.unwrap();
    assert_eq!(ids, vec![DocId::from_u64(3)]);

    // short text: filters alone, catalog order
    let filters = [Filter::new("sender.name", "acme")];
    let ids = retriever.retrieve(&filters, "ac").await.unwrap();
    assert_eq!(ids, vec![DocId::from_u64(3), DocId::from_u64(5)]);
}

#[tokio::test]
async fn test_hybrid_before_initialize() {
    let catalog = MetadataCatalog::from_json(CATALOG).unwrap();
    let (handle, _join) = IndexWorker::spawn_with(isolated_index());
    let retriever = HybridRetriever::new(handle, catalog);

    let ids = retriever.retrieve(&[], "Acme invoice").await.unwrap();
    assert!(ids.is_empty());

    // filter-only path does not touch the index
    let ids = retriever
        .retrieve(&[Filter::new("Tipo", "contratto")], "")
        .await
        .unwrap();
    assert_eq!(ids, vec![DocId::from_u64(7)]);

    // semantic text with filters degrades to the filter matches
    let ids = retriever
        .retrieve(&[Filter::new("Tipo", "contratto")], "lease agreement")
        .await
        .unwrap();
    assert_eq!(ids, vec![DocId::from_u64(7)]);
}
