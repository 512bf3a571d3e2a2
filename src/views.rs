//! Read-only views combining a [`Snapshot`] with a [`FilterState`].
//!
//! Views never parse input; they only aggregate records already normalized
//! by ingestion. Each view is a plain serializable struct so callers can
//! render or print it however they like.

use indexmap::IndexMap;
use serde::Serialize;

use crate::aggregate::{
    aggregate_by_attribute, aggregate_by_space, aggregate_by_year, attribute_series, top_labels,
    year_extent,
};
use crate::config::PipelineConfig;
use crate::constants::attributes::{CATEGORY, SEASON};
use crate::correlate::correlate;
use crate::data::{
    AttributeValue, CanonicalRecord, CorrelationSample, SeriesPoint, SourceKind, SpatialCluster,
};
use crate::filter::{FilterState, RecordPredicate, SpeciesRegistry};
use crate::ingestion::{Snapshot, SourceStatus};
use crate::metrics::{CorrelationSummary, correlation_summary};
use crate::normalize::FieldPlan;
use crate::types::{AttributeKey, CategoryName, Label, SeasonName, SourceId, YearRange};

/// Run `build` with the filter, registry-aware when a registry is given.
pub(crate) fn with_predicate<R>(
    filter: &FilterState,
    registry: Option<&SpeciesRegistry>,
    build: impl FnOnce(&dyn RecordPredicate) -> R,
) -> R {
    match registry {
        Some(registry) => build(&filter.with_registry(registry)),
        None => build(filter),
    }
}

fn distinct_text<'a, I>(records: I, attribute: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let mut values: Vec<String> = Vec::new();
    for record in records {
        if let Some(value) = record.text_attribute(attribute) {
            if !values.iter().any(|seen| seen == value) {
                values.push(value.to_string());
            }
        }
    }
    values
}

/// Cross-feed explorer: fisheries against cyclones on a shared year axis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExplorerView {
    /// Year range the view was computed for.
    pub year_range: YearRange,
    /// Years covered by any loaded record.
    pub data_extent: Option<YearRange>,
    /// Fisheries occurrences per year.
    pub fisheries_by_year: Vec<SeriesPoint>,
    /// Cyclone totals per year for the selected season(s).
    pub cyclones_by_year: Vec<SeriesPoint>,
    /// Cyclone totals per year, split by season.
    pub cyclones_by_season: IndexMap<SeasonName, Vec<SeriesPoint>>,
    /// Ocean readings summed per year, keyed by parameter.
    pub ocean_by_parameter: IndexMap<Label, Vec<SeriesPoint>>,
    /// Cyclone (x) against fisheries (y), driven by cyclone years.
    pub scatter: Vec<CorrelationSample>,
    /// Statistics over `scatter`.
    pub summary: CorrelationSummary,
    /// Fisheries map clusters.
    pub clusters: Vec<SpatialCluster>,
    /// Sources that failed their latest refresh, with reasons.
    pub unavailable: Vec<(SourceId, String)>,
}

impl ExplorerView {
    /// Build the explorer view.
    pub fn build(
        snapshot: &Snapshot,
        filter: &FilterState,
        registry: Option<&SpeciesRegistry>,
        config: &PipelineConfig,
    ) -> Self {
        with_predicate(filter, registry, |predicate| {
            let fisheries = snapshot.records_of(SourceKind::Fisheries);
            let cyclones = snapshot.records_of(SourceKind::CycloneTrackPoint);
            let ocean = snapshot.records_of(SourceKind::OceanParameter);

            let fisheries_by_year = aggregate_by_year(fisheries.iter().copied(), predicate);
            let cyclones_by_year = aggregate_by_year(cyclones.iter().copied(), predicate);
            let cyclones_by_season =
                aggregate_by_attribute(cyclones.iter().copied(), predicate, SEASON);

            let mut ocean_by_parameter = IndexMap::new();
            for record in &ocean {
                if ocean_by_parameter.contains_key(&record.label) {
                    continue;
                }
                let series = aggregate_by_year(
                    ocean
                        .iter()
                        .copied()
                        .filter(|other| other.label == record.label),
                    predicate,
                );
                ocean_by_parameter.insert(record.label.clone(), series);
            }

            let scatter = correlate(&cyclones_by_year, &fisheries_by_year, filter.year_range());
            let summary = correlation_summary(&scatter);
            let clusters = aggregate_by_space(
                fisheries.iter().copied(),
                predicate,
                config.cluster_options(),
            );

            Self {
                year_range: filter.year_range(),
                data_extent: year_extent(&snapshot.records),
                fisheries_by_year,
                cyclones_by_year,
                cyclones_by_season,
                ocean_by_parameter,
                scatter,
                summary,
                clusters,
                unavailable: unavailable_sources(snapshot),
            }
        })
    }
}

fn unavailable_sources(snapshot: &Snapshot) -> Vec<(SourceId, String)> {
    snapshot
        .unavailable()
        .map(|report| {
            let reason = match &report.status {
                SourceStatus::Unavailable { reason } => reason.clone(),
                _ => String::new(),
            };
            (report.source_id.clone(), reason)
        })
        .collect()
}

/// Fisheries dashboard: occurrence trend, map, and top species.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FisheriesView {
    /// Number of fisheries records passing the filter.
    pub record_count: usize,
    /// Occurrences per year.
    pub by_year: Vec<SeriesPoint>,
    /// Map clusters.
    pub clusters: Vec<SpatialCluster>,
    /// Most recorded species with counts.
    pub top_species: Vec<(Label, usize)>,
    /// Category choices for the category selector.
    pub categories: Vec<CategoryName>,
}

impl FisheriesView {
    /// Build the fisheries view.
    pub fn build(
        snapshot: &Snapshot,
        filter: &FilterState,
        registry: Option<&SpeciesRegistry>,
        config: &PipelineConfig,
    ) -> Self {
        let fisheries = snapshot.records_of(SourceKind::Fisheries);
        let categories = match registry {
            Some(registry) => registry
                .categories()
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => distinct_text(fisheries.iter().copied(), CATEGORY),
        };
        with_predicate(filter, registry, |predicate| Self {
            record_count: fisheries
                .iter()
                .filter(|record| predicate.matches(record))
                .count(),
            by_year: aggregate_by_year(fisheries.iter().copied(), predicate),
            clusters: aggregate_by_space(
                fisheries.iter().copied(),
                predicate,
                config.cluster_options(),
            ),
            top_species: top_labels(fisheries.iter().copied(), predicate, config.top_labels),
            categories,
        })
    }
}

/// Storm dashboard: cyclone totals and per-category columns for a season.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StormView {
    /// Seasons present in the loaded cyclone records.
    pub seasons: Vec<SeasonName>,
    /// Cyclone totals per year.
    pub totals_by_year: Vec<SeriesPoint>,
    /// Per-year sums of each category column of the seasonal frequency
    /// tables, in first-seen order.
    pub category_series: IndexMap<AttributeKey, Vec<SeriesPoint>>,
    /// Most frequent storm labels.
    pub top_storms: Vec<(Label, usize)>,
}

impl StormView {
    /// Build the storm view. Species and category selections do not apply.
    pub fn build(snapshot: &Snapshot, filter: &FilterState, config: &PipelineConfig) -> Self {
        let cyclones = snapshot.records_of(SourceKind::CycloneTrackPoint);
        // Category columns come from positionless frequency tables only;
        // track points carry measurements such as pressure instead.
        let mapped = FieldPlan::for_kind(SourceKind::CycloneTrackPoint).attributes;
        let tables: Vec<&CanonicalRecord> = cyclones
            .iter()
            .copied()
            .filter(|record| record.position.is_none())
            .collect();
        let mut columns: Vec<&str> = Vec::new();
        for record in tables.iter().filter(|record| filter.matches(record)) {
            for (key, value) in &record.attributes {
                if !matches!(value, AttributeValue::Number(_))
                    || mapped.iter().any(|name| name.eq_ignore_ascii_case(key))
                    || columns.contains(&key.as_str())
                {
                    continue;
                }
                columns.push(key.as_str());
            }
        }
        let category_series = columns
            .into_iter()
            .map(|column| {
                (
                    column.to_string(),
                    attribute_series(tables.iter().copied(), filter, column),
                )
            })
            .collect();

        Self {
            seasons: distinct_text(cyclones.iter().copied(), SEASON),
            totals_by_year: aggregate_by_year(cyclones.iter().copied(), filter),
            category_series,
            top_storms: top_labels(cyclones.iter().copied(), filter, config.top_labels),
        }
    }
}
