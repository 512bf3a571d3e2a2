use crate::data::{CanonicalRecord, SourceKind};
use crate::errors::PipelineError;
use crate::normalize::{NormalizeReport, normalize_rows};
use crate::source::{DataSource, SourceSnapshot};
use crate::types::SourceId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Availability of one source as of the latest accepted fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    /// Registered but no fetch has completed yet.
    Pending,
    /// The latest accepted fetch succeeded.
    Available,
    /// The latest accepted fetch failed; the source contributes no records.
    Unavailable {
        /// Failure message from the fetch.
        reason: String,
    },
}

/// Per-source view carried by a [`Snapshot`].
#[derive(Clone, Debug, PartialEq)]
pub struct SourceReport {
    /// Source identifier.
    pub source_id: SourceId,
    /// Kind of records the source produces.
    pub kind: SourceKind,
    /// Availability as of the latest accepted fetch.
    pub status: SourceStatus,
    /// Sequence number of the latest accepted fetch (`0` before any).
    pub sequence: u64,
    /// Records contributed to the snapshot.
    pub record_count: usize,
    /// Rows dropped by normalization in the latest accepted fetch.
    pub dropped: usize,
    /// Payload entries that failed to decode in the latest accepted fetch.
    pub malformed: usize,
    /// Completion time of the latest accepted fetch.
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Immutable, versioned view of the latest accepted records per source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Incremented on every accepted publish.
    pub version: u64,
    /// Records of every available source, in source registration order.
    pub records: Vec<CanonicalRecord>,
    /// Per-source status in registration order.
    pub sources: Vec<SourceReport>,
}

impl Snapshot {
    /// Records of one kind.
    pub fn records_of(&self, kind: SourceKind) -> Vec<&CanonicalRecord> {
        self.records
            .iter()
            .filter(|record| record.source_kind == kind)
            .collect()
    }

    /// Report for `source_id`, if registered.
    pub fn source(&self, source_id: &str) -> Option<&SourceReport> {
        self.sources
            .iter()
            .find(|report| report.source_id == source_id)
    }

    /// Sources whose latest accepted fetch failed.
    pub fn unavailable(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|report| matches!(report.status, SourceStatus::Unavailable { .. }))
    }

    /// True when no source contributed records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sequence tag handed out when a fetch starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    /// Source the fetch belongs to.
    pub source_id: SourceId,
    /// Per-source monotonically increasing fetch number.
    pub sequence: u64,
}

/// Result of one fetch cycle, ready to publish.
#[derive(Clone, Debug)]
pub enum FetchOutcome {
    /// Fetch and normalization succeeded.
    Loaded {
        /// Normalized records and drop count.
        report: NormalizeReport,
        /// Payload entries that failed to decode.
        malformed: usize,
    },
    /// The source could not be fetched.
    Failed {
        /// Failure message.
        reason: String,
    },
}

/// Thread-safe store of the latest accepted fetch per source.
///
/// Completions are accepted only when their sequence number is newer than
/// the last accepted one for that source, so a slow stale fetch can never
/// overwrite fresher data.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    slots: IndexMap<SourceId, SourceSlot>,
    version: u64,
}

struct SourceSlot {
    kind: SourceKind,
    issued: u64,
    accepted: u64,
    status: SourceStatus,
    records: Arc<Vec<CanonicalRecord>>,
    dropped: usize,
    malformed: usize,
    fetched_at: Option<DateTime<Utc>>,
}

impl SourceSlot {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            issued: 0,
            accepted: 0,
            status: SourceStatus::Pending,
            records: Arc::new(Vec::new()),
            dropped: 0,
            malformed: 0,
            fetched_at: None,
        }
    }
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source slot. Re-registering an id keeps its state.
    pub fn register(&self, source_id: &str, kind: SourceKind) {
        let mut inner = self.inner.write().expect("snapshot store poisoned");
        inner
            .slots
            .entry(source_id.to_string())
            .or_insert_with(|| SourceSlot::new(kind));
    }

    /// Start a fetch for `source_id` and return its sequence ticket.
    pub fn begin_fetch(&self, source_id: &str) -> Result<FetchTicket, PipelineError> {
        let mut inner = self.inner.write().expect("snapshot store poisoned");
        let slot = inner.slots.get_mut(source_id).ok_or_else(|| {
            PipelineError::Configuration(format!("source '{source_id}' is not registered"))
        })?;
        slot.issued = slot.issued.saturating_add(1);
        Ok(FetchTicket {
            source_id: source_id.to_string(),
            sequence: slot.issued,
        })
    }

    /// Publish a completed fetch.
    ///
    /// Returns `false` (and changes nothing) when a newer fetch for the same
    /// source has already been accepted. A failed fetch clears the source's
    /// records and marks it unavailable.
    pub fn publish(&self, ticket: &FetchTicket, outcome: FetchOutcome) -> bool {
        let mut inner = self.inner.write().expect("snapshot store poisoned");
        let Some(slot) = inner.slots.get_mut(&ticket.source_id) else {
            debug!(source_id = %ticket.source_id, "ignoring completion for unknown source");
            return false;
        };
        if ticket.sequence <= slot.accepted {
            debug!(
                source_id = %ticket.source_id,
                sequence = ticket.sequence,
                accepted = slot.accepted,
                "ignoring stale fetch completion"
            );
            return false;
        }
        slot.accepted = ticket.sequence;
        slot.fetched_at = Some(Utc::now());
        match outcome {
            FetchOutcome::Loaded { report, malformed } => {
                slot.status = SourceStatus::Available;
                slot.records = Arc::new(report.records);
                slot.dropped = report.dropped;
                slot.malformed = malformed;
            }
            FetchOutcome::Failed { reason } => {
                slot.status = SourceStatus::Unavailable { reason };
                slot.records = Arc::new(Vec::new());
                slot.dropped = 0;
                slot.malformed = 0;
            }
        }
        inner.version = inner.version.saturating_add(1);
        true
    }

    /// Assemble an immutable snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().expect("snapshot store poisoned");
        let mut records = Vec::new();
        let mut sources = Vec::with_capacity(inner.slots.len());
        for (source_id, slot) in &inner.slots {
            if slot.status == SourceStatus::Available {
                records.extend(slot.records.iter().cloned());
            }
            sources.push(SourceReport {
                source_id: source_id.clone(),
                kind: slot.kind,
                status: slot.status.clone(),
                sequence: slot.accepted,
                record_count: slot.records.len(),
                dropped: slot.dropped,
                malformed: slot.malformed,
                fetched_at: slot.fetched_at,
            });
        }
        Snapshot {
            version: inner.version,
            records,
            sources,
        }
    }

    /// Current snapshot version.
    pub fn version(&self) -> u64 {
        self.inner.read().expect("snapshot store poisoned").version
    }
}

#[derive(Clone, Debug, Default)]
/// Last-refresh telemetry captured per source.
pub struct SourceRefreshStats {
    /// Duration of the most recent refresh in milliseconds.
    pub last_refresh_ms: u128,
    /// Raw rows returned by the most recent refresh.
    pub last_row_count: usize,
    /// Canonical records kept from the most recent refresh.
    pub last_record_count: usize,
    /// Rows dropped by normalization in the most recent refresh.
    pub last_dropped: usize,
    /// Last refresh error message, if any.
    pub last_error: Option<String>,
    /// Total refresh failures seen for this source.
    pub error_count: u64,
}

/// Coordinates concurrent source refresh and snapshot publication.
pub struct IngestionManager {
    store: SnapshotStore,
    sources: Vec<SourceState>,
}

struct SourceState {
    source: Box<dyn DataSource + 'static>,
    stats: SourceRefreshStats,
}

impl Default for IngestionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionManager {
    /// Create a manager with a fresh store.
    pub fn new() -> Self {
        Self::with_store(SnapshotStore::new())
    }

    /// Create a manager publishing into an existing store.
    pub fn with_store(store: SnapshotStore) -> Self {
        Self {
            store,
            sources: Vec::new(),
        }
    }

    /// Register a source for refresh.
    pub fn register_source(&mut self, source: Box<dyn DataSource + 'static>) {
        self.store.register(source.id(), source.kind());
        self.sources.push(SourceState {
            source,
            stats: SourceRefreshStats::default(),
        });
    }

    /// True when at least one source is registered.
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Return latest refresh telemetry for each registered source.
    pub fn source_refresh_stats(&self) -> Vec<(SourceId, SourceRefreshStats)> {
        self.sources
            .iter()
            .map(|state| (state.source.id().to_string(), state.stats.clone()))
            .collect()
    }

    /// Access the shared snapshot store.
    pub fn store(&self) -> SnapshotStore {
        self.store.clone()
    }

    /// Refresh every registered source concurrently and return the new snapshot.
    pub fn refresh_all(&mut self) -> Snapshot {
        self.refresh_where(|_| true)
    }

    /// Refresh only sources of `kind` (cadences differ per feed).
    pub fn refresh_kind(&mut self, kind: SourceKind) -> Snapshot {
        self.refresh_where(|source| source.kind() == kind)
    }

    fn refresh_where(&mut self, wanted: impl Fn(&dyn DataSource) -> bool) -> Snapshot {
        let mut plan = Vec::new();
        for (idx, state) in self.sources.iter().enumerate() {
            if !wanted(state.source.as_ref()) {
                continue;
            }
            match self.store.begin_fetch(state.source.id()) {
                Ok(ticket) => plan.push((idx, ticket)),
                Err(err) => warn!(source_id = %state.source.id(), error = %err, "cannot start fetch"),
            }
        }

        let mut results: Vec<(usize, FetchTicket, Result<FetchedBatch, PipelineError>, Duration)> =
            Vec::with_capacity(plan.len());
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(plan.len());
            for (idx, ticket) in plan {
                let source = self.sources[idx].source.as_ref();
                handles.push((
                    idx,
                    ticket,
                    scope.spawn(move || {
                        let start = Instant::now();
                        let result = fetch_and_normalize(source);
                        (result, start.elapsed())
                    }),
                ));
            }
            for (idx, ticket, handle) in handles {
                let (result, elapsed) = match handle.join() {
                    Ok((result, elapsed)) => {
                        debug!(
                            source_id = %ticket.source_id,
                            sequence = ticket.sequence,
                            refresh_ms = elapsed.as_millis(),
                            "source fetch completed"
                        );
                        (result, elapsed)
                    }
                    Err(_) => (
                        Err(PipelineError::SourceUnavailable {
                            source_id: ticket.source_id.clone(),
                            reason: "source fetch thread panicked".into(),
                        }),
                        Duration::from_secs(0),
                    ),
                };
                results.push((idx, ticket, result, elapsed));
            }
        });

        for (idx, ticket, result, elapsed) in results {
            let stats = &mut self.sources[idx].stats;
            stats.last_refresh_ms = elapsed.as_millis();
            let outcome = match result {
                Ok(batch) => {
                    stats.last_row_count = batch.row_count;
                    stats.last_record_count = batch.report.records.len();
                    stats.last_dropped = batch.report.dropped;
                    stats.last_error = None;
                    debug!(
                        source_id = %ticket.source_id,
                        rows = batch.row_count,
                        records = batch.report.records.len(),
                        dropped = batch.report.dropped,
                        malformed = batch.malformed,
                        "source normalized"
                    );
                    FetchOutcome::Loaded {
                        report: batch.report,
                        malformed: batch.malformed,
                    }
                }
                Err(err) => {
                    stats.last_row_count = 0;
                    stats.last_record_count = 0;
                    stats.last_dropped = 0;
                    stats.last_error = Some(err.to_string());
                    stats.error_count = stats.error_count.saturating_add(1);
                    warn!(source_id = %ticket.source_id, error = %err, "source unavailable");
                    FetchOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            self.store.publish(&ticket, outcome);
        }
        self.store.snapshot()
    }
}

struct FetchedBatch {
    report: NormalizeReport,
    row_count: usize,
    malformed: usize,
}

fn fetch_and_normalize(source: &dyn DataSource) -> Result<FetchedBatch, PipelineError> {
    let SourceSnapshot {
        rows, malformed, ..
    } = source.fetch()?;
    let report = normalize_rows(&rows, source.kind());
    Ok(FetchedBatch {
        report,
        row_count: rows.len(),
        malformed,
    })
}
