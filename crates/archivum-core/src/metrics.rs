//! Rolling timing metrics for ingest, search, and reindex.
//!
//! Every [`SemanticIndex`](crate::index::SemanticIndex) built with
//! `SemanticIndex::new()` records into the process-wide collector returned
//! by [`global_metrics`]. Tests pass their own collector through
//! `SemanticIndex::with_metrics` to get isolated numbers.
//!
//! Averages cover a sliding window (one minute for ingest, five for search);
//! lifetime totals are kept separately and survive pruning.

use instant::Instant;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

const INGEST_WINDOW: Duration = Duration::from_secs(60);
const SEARCH_WINDOW: Duration = Duration::from_secs(300);

/// Upper bound on retained samples per series.
const MAX_SAMPLES: usize = 1000;

/// One series of durations with a sliding window.
#[derive(Debug)]
struct RollingTimings {
    window: Duration,
    samples: VecDeque<(Instant, f64)>,
    lifetime: u64,
}

impl RollingTimings {
    fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
            lifetime: 0,
        }
    }

    fn push(&mut self, ms: f64) {
        self.lifetime += 1;
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((Instant::now(), ms));
    }

    fn cutoff(&self) -> Option<Instant> {
        Instant::now().checked_sub(self.window)
    }

    fn prune(&mut self) {
        let Some(cutoff) = self.cutoff() else {
            return;
        };
        while self.samples.front().is_some_and(|(at, _)| *at < cutoff) {
            self.samples.pop_front();
        }
    }

    fn recent(&self) -> impl Iterator<Item = f64> + '_ {
        let cutoff = self.cutoff();
        self.samples
            .iter()
            .filter(move |(at, _)| cutoff.is_none_or(|c| *at >= c))
            .map(|(_, ms)| *ms)
    }

    fn count(&self) -> usize {
        self.recent().count()
    }

    fn mean(&self) -> Option<f64> {
        let (sum, n) = self.recent().fold((0.0, 0usize), |(s, n), ms| (s + ms, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Samples per second across the window.
    fn rate(&self) -> f64 {
        self.count() as f64 / self.window.as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy)]
struct LastSearch {
    candidates: usize,
    results: usize,
    top_score: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
struct LastReindex {
    documents: usize,
    duration_ms: f64,
}

#[derive(Debug)]
struct Collector {
    ingest_embed: RollingTimings,
    ingest_persist: RollingTimings,
    query_embed: RollingTimings,
    scan: RollingTimings,
    search_total: RollingTimings,
    last_search: Option<LastSearch>,
    last_reindex: Option<LastReindex>,
}

impl Collector {
    fn new(ingest_window: Duration, search_window: Duration) -> Self {
        Self {
            ingest_embed: RollingTimings::new(ingest_window),
            ingest_persist: RollingTimings::new(ingest_window),
            query_embed: RollingTimings::new(search_window),
            scan: RollingTimings::new(search_window),
            search_total: RollingTimings::new(search_window),
            last_search: None,
            last_reindex: None,
        }
    }

    fn series_mut(&mut self) -> [&mut RollingTimings; 5] {
        [
            &mut self.ingest_embed,
            &mut self.ingest_persist,
            &mut self.query_embed,
            &mut self.scan,
            &mut self.search_total,
        ]
    }
}

/// Point-in-time view of the collected metrics.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Mean embedding time per ingested document (ms)
    pub embedding_avg_ms: Option<f64>,
    pub embedding_count: usize,
    /// Ingests per second
    pub embedding_throughput: f64,

    /// Mean store write time per ingested document (ms)
    pub persist_avg_ms: Option<f64>,
    pub persist_count: usize,

    pub total_documents_ingested: u64,
    pub total_searches: u64,

    pub search: SearchSnapshot,
    pub reindex: ReindexSnapshot,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchSnapshot {
    pub query_embed_avg_ms: Option<f64>,
    pub scan_avg_ms: Option<f64>,
    pub total_latency_avg_ms: Option<f64>,
    /// Searches inside the window
    pub query_count: usize,

    pub last_result_count: Option<usize>,
    /// Cache size scanned by the last search
    pub last_candidate_count: Option<usize>,
    pub last_top_score: Option<f32>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ReindexSnapshot {
    pub last_document_count: Option<usize>,
    pub last_duration_ms: Option<f64>,
}

/// Shared, thread-safe metrics collector.
///
/// Cloning is cheap and every clone records into the same data. A poisoned
/// lock drops the sample instead of panicking.
#[derive(Clone)]
pub struct PerformanceMetrics {
    inner: Arc<RwLock<Collector>>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::with_windows(INGEST_WINDOW, SEARCH_WINDOW)
    }

    /// Collector with one window for every series.
    pub fn with_window(window_secs: u64) -> Self {
        let window = Duration::from_secs(window_secs);
        Self::with_windows(window, window)
    }

    fn with_windows(ingest: Duration, search: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collector::new(ingest, search))),
        }
    }

    fn update(&self, f: impl FnOnce(&mut Collector)) {
        if let Ok(mut collector) = self.inner.write() {
            f(&mut collector);
        }
    }

    /// Records one successful ingest.
    pub fn record_ingest(&self, embed_ms: f64, persist_ms: f64) {
        self.update(|c| {
            c.ingest_embed.push(embed_ms);
            c.ingest_persist.push(persist_ms);
        });
    }

    /// Records a completed reindex run.
    pub fn record_reindex(&self, documents: usize, duration_ms: f64) {
        self.update(|c| {
            c.last_reindex = Some(LastReindex {
                documents,
                duration_ms,
            })
        });
    }

    /// Records a completed search over `candidates` cached vectors.
    pub fn record_search(
        &self,
        query_embed_ms: f64,
        scan_ms: f64,
        candidates: usize,
        results: usize,
        top_score: Option<f32>,
    ) {
        self.update(|c| {
            c.query_embed.push(query_embed_ms);
            c.scan.push(scan_ms);
            c.search_total.push(query_embed_ms + scan_ms);
            c.last_search = Some(LastSearch {
                candidates,
                results,
                top_score,
            });
        });
    }

    /// Drops samples that have left their window.
    pub fn prune(&self) {
        self.update(|c| c.series_mut().into_iter().for_each(RollingTimings::prune));
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let Ok(c) = self.inner.read() else {
            return MetricsSnapshot::default();
        };

        MetricsSnapshot {
            embedding_avg_ms: c.ingest_embed.mean(),
            embedding_count: c.ingest_embed.count(),
            embedding_throughput: c.ingest_embed.rate(),
            persist_avg_ms: c.ingest_persist.mean(),
            persist_count: c.ingest_persist.count(),
            total_documents_ingested: c.ingest_persist.lifetime,
            total_searches: c.search_total.lifetime,
            search: SearchSnapshot {
                query_embed_avg_ms: c.query_embed.mean(),
                scan_avg_ms: c.scan.mean(),
                total_latency_avg_ms: c.search_total.mean(),
                query_count: c.search_total.count(),
                last_result_count: c.last_search.map(|s| s.results),
                last_candidate_count: c.last_search.map(|s| s.candidates),
                last_top_score: c.last_search.and_then(|s| s.top_score),
            },
            reindex: ReindexSnapshot {
                last_document_count: c.last_reindex.map(|r| r.documents),
                last_duration_ms: c.last_reindex.map(|r| r.duration_ms),
            },
        }
    }

    /// Window used for ingest averages.
    pub fn window(&self) -> Duration {
        self.inner
            .read()
            .map(|c| c.ingest_embed.window)
            .unwrap_or(INGEST_WINDOW)
    }

    /// Forgets every sample, total, and last-run record.
    pub fn clear(&self) {
        self.update(|c| {
            *c = Collector::new(c.ingest_embed.window, c.search_total.window);
        });
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_METRICS: Lazy<PerformanceMetrics> = Lazy::new(PerformanceMetrics::new);

/// The process-wide collector.
pub fn global_metrics() -> &'static PerformanceMetrics {
    &GLOBAL_METRICS
}
