#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Temporal and spatial aggregation.
pub mod aggregate;
/// CLI runners used by the `oceansense` binary.
pub mod apps;
/// Pipeline settings and the JSON source manifest.
pub mod config;
/// Centralized constants used across normalization, aggregation, and export.
pub mod constants;
/// Year alignment of two series.
pub mod correlate;
/// Canonical record and aggregate output types.
pub mod data;
/// Calendar year extraction from loosely formatted dates.
pub mod dates;
/// Flat CSV export.
pub mod export;
/// Ordered field alias resolution.
pub mod fields;
/// Filter state, predicates, and the species registry.
pub mod filter;
/// Concurrent source refresh and versioned snapshots.
pub mod ingestion;
/// Correlation statistics.
pub mod metrics;
/// Raw row to canonical record normalization.
pub mod normalize;
/// Data source traits and built-in sources.
pub mod source;
/// Input transports used by sources (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text and numeric helpers.
pub mod utils;
/// Page-shaped read models over a snapshot.
pub mod views;

mod errors;

pub use aggregate::{
    ClusterOptions, aggregate_by_attribute, aggregate_by_space, aggregate_by_year,
    attribute_series, top_labels, year_extent,
};
pub use config::{PipelineConfig, RefreshSchedule, SourceEntry, SourceManifest};
pub use correlate::correlate;
pub use data::{
    AttributeValue, CanonicalRecord, CorrelationSample, GeoPoint, SeriesPoint, SourceKind,
    SpatialCluster,
};
pub use errors::PipelineError;
pub use export::{export_csv, write_export};
pub use filter::{FilterState, RecordPredicate, Selection, SpeciesRegistry};
pub use ingestion::{IngestionManager, Snapshot, SnapshotStore, SourceStatus};
pub use metrics::{CorrelationSummary, correlation_summary, pearson};
pub use normalize::{NormalizeReport, normalize_row, normalize_rows};
pub use source::row_view::{RawRow, RawValue};
pub use source::sources::file_source::{FileSource, FileSourceConfig};
pub use source::{DataSource, InMemorySource, SourceSnapshot};
pub use types::{
    AttributeKey, CategoryName, FieldName, Label, SeasonName, SourceId, Year, YearRange,
};
pub use views::{ExplorerView, FisheriesView, StormView};
