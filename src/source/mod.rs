//! Data source interfaces and raw row decoding.
//!
//! Ownership model:
//! - `DataSource` is the ingestion-facing interface that produces raw rows.
//! - Decoding (`decode`) turns CSV/JSON payloads into `RawRow`s.
//! - Normalization happens after fetch, in the ingestion layer, so sources
//!   never produce canonical records themselves.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::data::SourceKind;
use crate::errors::PipelineError;
use crate::types::SourceId;

/// CSV/JSON payload decoding.
pub mod decode;
/// Source-agnostic raw row model.
pub mod row_view;
/// Source implementation modules.
pub mod sources;

use row_view::RawRow;

/// Result of a single source fetch.
#[derive(Clone, Debug)]
pub struct SourceSnapshot {
    /// Decoded rows, in payload order.
    pub rows: Vec<RawRow>,
    /// Payload entries that could not be decoded into rows.
    pub malformed: usize,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
    /// Most recent modification time of the underlying data, when known.
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceSnapshot {
    /// Snapshot of `rows` fetched now.
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            malformed: 0,
            fetched_at: Utc::now(),
            last_modified: None,
        }
    }

    /// Set the malformed entry count.
    pub fn with_malformed(mut self, malformed: usize) -> Self {
        self.malformed = malformed;
        self
    }

    /// Set the data modification time.
    pub fn with_last_modified(mut self, last_modified: Option<DateTime<Utc>>) -> Self {
        self.last_modified = last_modified;
        self
    }
}

/// Ingestion-facing data source interface.
///
/// Each fetch is independent and returns the full current payload; the
/// ingestion layer replaces the source's records wholesale with the result.
/// Network-backed feeds implement this trait outside the crate.
pub trait DataSource: Send + Sync {
    /// Stable source identifier used in snapshots and logs.
    fn id(&self) -> &str;
    /// Kind of records this source produces.
    fn kind(&self) -> SourceKind;
    /// Fetch and decode the current payload.
    ///
    /// Return `Err` when the source is unreachable; row-level problems are
    /// reported through `SourceSnapshot::malformed` instead.
    fn fetch(&self) -> Result<SourceSnapshot, PipelineError>;
}

/// In-memory data source for tests and small datasets.
pub struct InMemorySource {
    id: SourceId,
    kind: SourceKind,
    rows: Arc<Vec<RawRow>>,
}

impl InMemorySource {
    /// Create an in-memory source from prebuilt rows.
    pub fn new(id: impl Into<SourceId>, kind: SourceKind, rows: Vec<RawRow>) -> Self {
        Self {
            id: id.into(),
            kind,
            rows: Arc::new(rows),
        }
    }
}

impl DataSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch(&self) -> Result<SourceSnapshot, PipelineError> {
        Ok(SourceSnapshot::new(self.rows.as_ref().clone()))
    }
}
