//! Index worker implementation.
//!
//! A single tokio task owns the [`SemanticIndex`] and drains one bounded
//! channel. Every command, typed or boundary, goes through that channel, so
//! commands complete in submission order and a search queued after an
//! ingest always sees its effects. Nothing is cancelled: callers that need
//! timeouts wrap the returned futures themselves.

use super::protocol::{Command, Event, ProtocolError};
use crate::config::{IndexConfig, COMMAND_QUEUE_CAPACITY};
use crate::error::IndexError;
use crate::index::{DocId, IndexDocument, IndexStats, ReindexProgress, SearchResult, SemanticIndex};
use crate::metrics::MetricsSnapshot;
use crate::storage::BackingMode;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Internal message type for worker communication.
enum WorkerMessage {
    Initialize {
        config: IndexConfig,
        response: oneshot::Sender<Result<BackingMode, IndexError>>,
    },
    Ingest {
        id: DocId,
        text: String,
        response: oneshot::Sender<Result<(), IndexError>>,
    },
    Search {
        query: String,
        response: oneshot::Sender<Result<Vec<SearchResult>, IndexError>>,
    },
    ReindexAll {
        documents: Vec<IndexDocument>,
        progress: Option<mpsc::UnboundedSender<ReindexProgress>>,
        response: oneshot::Sender<Result<usize, IndexError>>,
    },
    GetText {
        id: DocId,
        response: oneshot::Sender<Result<Option<String>, IndexError>>,
    },
    Stats {
        response: oneshot::Sender<IndexStats>,
    },
    Metrics {
        response: oneshot::Sender<MetricsSnapshot>,
    },
    /// Boundary command; outcomes go to `events`
    Dispatch {
        command: Command,
        events: mpsc::UnboundedSender<Event>,
    },
    Shutdown,
}

/// The actor that owns a [`SemanticIndex`].
pub struct IndexWorker {
    index: SemanticIndex,
    rx: mpsc::Receiver<WorkerMessage>,
}

impl IndexWorker {
    /// Spawns a worker around an uninitialized index.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> (IndexHandle, JoinHandle<()>) {
        Self::spawn_with(SemanticIndex::new())
    }

    /// Spawns a worker around `index`, which may already be initialized.
    pub fn spawn_with(index: SemanticIndex) -> (IndexHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let worker = IndexWorker { index, rx };
        let join = tokio::spawn(worker.run());
        info!("Index worker started");
        (IndexHandle { tx }, join)
    }

    /// Worker main loop. Returns on Shutdown or when every handle is dropped.
    async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                WorkerMessage::Initialize { config, response } => {
                    let result = self.index.initialize(&config).await;
                    let _ = response.send(result);
                }
                WorkerMessage::Ingest { id, text, response } => {
                    let result = self.index.ingest(id, &text).await;
                    let _ = response.send(result);
                }
                WorkerMessage::Search { query, response } => {
                    let result = self.index.search(&query).await;
                    let _ = response.send(result);
                }
                WorkerMessage::ReindexAll {
                    documents,
                    progress,
                    response,
                } => {
                    let result = self
                        .index
                        .reindex_all(&documents, |p| {
                            if let Some(tx) = &progress {
                                let _ = tx.send(p);
                            }
                        })
                        .await;
                    let _ = response.send(result);
                }
                WorkerMessage::GetText { id, response } => {
                    let _ = response.send(self.index.get_text(id).await);
                }
                WorkerMessage::Stats { response } => {
                    let _ = response.send(self.index.stats());
                }
                WorkerMessage::Metrics { response } => {
                    let _ = response.send(self.index.metrics());
                }
                WorkerMessage::Dispatch { command, events } => {
                    debug!("Processing {} command", command.name());
                    if !self.dispatch(command, &events).await {
                        info!("Index worker received shutdown command");
                        return;
                    }
                }
                WorkerMessage::Shutdown => {
                    info!("Index worker received shutdown signal");
                    return;
                }
            }
        }
        info!("Index worker channel disconnected, shutting down");
    }

    /// Executes a boundary command. Returns false when the loop should stop.
    async fn dispatch(&mut self, command: Command, events: &mpsc::UnboundedSender<Event>) -> bool {
        let event = match command {
            Command::Initialize { config } => match self.index.initialize(&config).await {
                Ok(backing_mode) => Event::Ready { backing_mode },
                Err(e) => {
                    warn!("Initialize failed: {}", e);
                    Event::error(&e, None)
                }
            },
            Command::IngestDocument { id, text } => match self.index.ingest(id, &text).await {
                Ok(()) => Event::Ingested { id },
                Err(e) => Event::error(&e, Some(id)),
            },
            Command::Search { query } => match self.index.search(&query).await {
                Ok(results) => Event::SearchResults { results },
                Err(e) => Event::error(&e, None),
            },
            Command::ReindexAll { documents } => {
                let progress_events = events.clone();
                let result = self
                    .index
                    .reindex_all(&documents, move |p| {
                        let _ = progress_events.send(Event::from(p));
                    })
                    .await;
                match result {
                    Ok(indexed_count) => Event::ReindexComplete { indexed_count },
                    Err(e) => Event::error(&e, None),
                }
            }
            Command::Stats => Event::Stats {
                stats: self.index.stats(),
            },
            Command::Shutdown => {
                let _ = events.send(Event::ShuttingDown);
                return false;
            }
        };
        let _ = events.send(event);
        true
    }
}

/// Cloneable front end to an [`IndexWorker`].
///
/// Every method enqueues one message; the returned future resolves when the
/// worker has processed it.
#[derive(Clone)]
pub struct IndexHandle {
    tx: mpsc::Sender<WorkerMessage>,
}

impl IndexHandle {
    async fn send(&self, message: WorkerMessage) -> Result<(), IndexError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| ProtocolError::ChannelClosed.into())
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> WorkerMessage,
    ) -> Result<T, IndexError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(build(response_tx)).await?;
        response_rx
            .await
            .map_err(|_| ProtocolError::ChannelClosed.into())
    }

    pub async fn initialize(&self, config: IndexConfig) -> Result<BackingMode, IndexError> {
        self.request(|response| WorkerMessage::Initialize { config, response })
            .await?
    }

    pub async fn ingest(&self, id: DocId, text: impl Into<String>) -> Result<(), IndexError> {
        let text = text.into();
        self.request(|response| WorkerMessage::Ingest { id, text, response })
            .await?
    }

    pub async fn search(&self, query: impl Into<String>) -> Result<Vec<SearchResult>, IndexError> {
        let query = query.into();
        self.request(|response| WorkerMessage::Search { query, response })
            .await?
    }

    /// Reindexes `documents`, optionally streaming progress to `progress`.
    pub async fn reindex_all(
        &self,
        documents: Vec<IndexDocument>,
        progress: Option<mpsc::UnboundedSender<ReindexProgress>>,
    ) -> Result<usize, IndexError> {
        self.request(|response| WorkerMessage::ReindexAll {
            documents,
            progress,
            response,
        })
        .await?
    }

    pub async fn get_text(&self, id: DocId) -> Result<Option<String>, IndexError> {
        self.request(|response| WorkerMessage::GetText { id, response })
            .await?
    }

    pub async fn stats(&self) -> Result<IndexStats, IndexError> {
        self.request(|response| WorkerMessage::Stats { response })
            .await
    }

    pub async fn metrics(&self) -> Result<MetricsSnapshot, IndexError> {
        self.request(|response| WorkerMessage::Metrics { response })
            .await
    }

    /// Enqueues a boundary command without waiting for it to run.
    ///
    /// The command's outcome (and any progress) is sent to `events`. Waits
    /// only if the queue is full.
    pub async fn submit(
        &self,
        command: Command,
        events: mpsc::UnboundedSender<Event>,
    ) -> Result<(), IndexError> {
        self.send(WorkerMessage::Dispatch { command, events }).await
    }

    /// Asks the worker to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), IndexError> {
        self.send(WorkerMessage::Shutdown).await
    }
}
