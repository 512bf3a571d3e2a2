//! Temporal and spatial aggregation over canonical records.
//!
//! Every function filters first, then groups. Totals are plain sums; years
//! with no qualifying records are absent from the output.

use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::constants::aggregate::{DEFAULT_CLUSTER_CAP, DEFAULT_CLUSTER_PRECISION};
use crate::data::{CanonicalRecord, SeriesPoint, SpatialCluster};
use crate::filter::RecordPredicate;
use crate::types::{Label, Year, YearRange};
use crate::utils::{grid_key, grid_value};

/// Rounding and truncation settings for [`aggregate_by_space`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Decimal digits kept when rounding coordinates.
    pub precision: u32,
    /// Maximum number of clusters returned.
    pub cap: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_CLUSTER_PRECISION,
            cap: DEFAULT_CLUSTER_CAP,
        }
    }
}

impl ClusterOptions {
    /// Override rounding precision.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Override the cluster cap.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }
}

/// Per-year totals of the records admitted by `filter`, ascending by year.
///
/// Records with a `value` contribute it; records without one count once.
pub fn aggregate_by_year<'a, I, P>(records: I, filter: &P) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
    P: RecordPredicate + ?Sized,
{
    let mut totals: BTreeMap<Year, f64> = BTreeMap::new();
    for record in records.into_iter().filter(|record| filter.matches(record)) {
        *totals.entry(record.year).or_insert(0.0) += record.weight();
    }
    into_series(totals)
}

/// Clusters of records sharing a rounded `(lat, lon)` cell.
///
/// Records without a position are skipped. Clusters keep first-seen order
/// and anything past `options.cap` is dropped.
pub fn aggregate_by_space<'a, I, P>(
    records: I,
    filter: &P,
    options: ClusterOptions,
) -> Vec<SpatialCluster>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
    P: RecordPredicate + ?Sized,
{
    let mut cells: IndexMap<(i64, i64), SpatialCluster> = IndexMap::new();
    for record in records.into_iter().filter(|record| filter.matches(record)) {
        let Some(point) = record.position else {
            continue;
        };
        let key = (
            grid_key(point.lat, options.precision),
            grid_key(point.lon, options.precision),
        );
        let cluster = cells.entry(key).or_insert_with(|| SpatialCluster {
            lat: grid_value(key.0, options.precision),
            lon: grid_value(key.1, options.precision),
            count: 0,
            labels: BTreeSet::new(),
        });
        cluster.count += 1;
        if !cluster.labels.contains(&record.label) {
            cluster.labels.insert(record.label.clone());
        }
    }
    if cells.len() > options.cap {
        debug!(
            clusters = cells.len(),
            cap = options.cap,
            "truncating spatial clusters to cap"
        );
        cells.truncate(options.cap);
    }
    cells.into_values().collect()
}

/// Per-year series for each distinct value of a text attribute, in
/// first-seen attribute order.
///
/// Records lacking the attribute are skipped. Used for per-season cyclone
/// frequency.
pub fn aggregate_by_attribute<'a, I, P>(
    records: I,
    filter: &P,
    attribute: &str,
) -> IndexMap<String, Vec<SeriesPoint>>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
    P: RecordPredicate + ?Sized,
{
    let mut groups: IndexMap<String, BTreeMap<Year, f64>> = IndexMap::new();
    for record in records.into_iter().filter(|record| filter.matches(record)) {
        let Some(group) = record.text_attribute(attribute) else {
            continue;
        };
        *groups
            .entry(group.to_string())
            .or_default()
            .entry(record.year)
            .or_insert(0.0) += record.weight();
    }
    groups
        .into_iter()
        .map(|(group, totals)| (group, into_series(totals)))
        .collect()
}

/// Per-year sum of a numeric attribute.
///
/// Records where the attribute is missing or not numeric are skipped, so a
/// year appears only if some record carried the attribute.
pub fn attribute_series<'a, I, P>(records: I, filter: &P, attribute: &str) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
    P: RecordPredicate + ?Sized,
{
    let mut totals: BTreeMap<Year, f64> = BTreeMap::new();
    for record in records.into_iter().filter(|record| filter.matches(record)) {
        if let Some(value) = record.numeric_attribute(attribute) {
            *totals.entry(record.year).or_insert(0.0) += value;
        }
    }
    into_series(totals)
}

/// The `limit` most frequent labels, by count descending then label ascending.
pub fn top_labels<'a, I, P>(records: I, filter: &P, limit: usize) -> Vec<(Label, usize)>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
    P: RecordPredicate + ?Sized,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records.into_iter().filter(|record| filter.matches(record)) {
        *counts.entry(record.label.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(Label, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    // Stable sort keeps the label order from the BTreeMap for ties.
    ranked.sort_by(|left, right| right.1.cmp(&left.1));
    ranked.truncate(limit);
    ranked
}

/// Smallest and largest year across `records`, or `None` when empty.
pub fn year_extent<'a, I>(records: I) -> Option<YearRange>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    records.into_iter().fold(None, |extent, record| match extent {
        None => Some((record.year, record.year)),
        Some((min, max)) => Some((min.min(record.year), max.max(record.year))),
    })
}

fn into_series(totals: BTreeMap<Year, f64>) -> Vec<SeriesPoint> {
    totals
        .into_iter()
        .map(|(year, total)| SeriesPoint { year, total })
        .collect()
}
