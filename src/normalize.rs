//! Raw row to [`CanonicalRecord`] conversion.
//!
//! Ownership model:
//! - `FieldPlan` is the static, per-kind description of which aliases feed
//!   which canonical field.
//! - `normalize_row` is a pure function of one row and its kind.
//! - `normalize_rows` runs a batch and reports how many rows were dropped.

use indexmap::IndexMap;
use tracing::debug;

use crate::constants::aliases;
use crate::constants::normalize::{MAX_ABS_LATITUDE, MAX_ABS_LONGITUDE, UNKNOWN_LABEL};
use crate::data::{AttributeValue, CanonicalRecord, GeoPoint, SourceKind};
use crate::dates::{explicit_year, year_from_date_str};
use crate::fields::{FieldAliases, FieldCandidate};
use crate::source::row_view::{RawRow, RawValue};
use crate::types::{AttributeKey, Year};
use crate::utils::normalize_inline_whitespace;

const FISHERIES_ATTRIBUTES: &[&str] = &[
    "depth",
    "datasetName",
    "basisOfRecord",
    "individualCount",
    "category",
];
const CYCLONE_ATTRIBUTES: &[&str] = &["pressure", "season", "basin", "category", "datetime"];
const OCEAN_ATTRIBUTES: &[&str] = &["depth", "dataset", "unit"];

/// Per-kind field mapping used by the normalizer.
#[derive(Clone, Copy, Debug)]
pub struct FieldPlan {
    /// Identity candidates.
    pub label: FieldAliases,
    /// Numeric payload candidates.
    pub value: FieldAliases,
    /// Auxiliary fields copied verbatim (matched case-insensitively).
    pub attributes: &'static [&'static str],
    /// Copy every remaining numeric column as an attribute.
    ///
    /// Seasonal cyclone tables carry one count column per cyclone category;
    /// keeping them makes category-wise series possible.
    pub keep_remaining_numeric: bool,
}

impl FieldPlan {
    /// Mapping for records of `kind`.
    pub const fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Fisheries => Self {
                label: aliases::FISHERIES_LABEL,
                value: aliases::FISHERIES_VALUE,
                attributes: FISHERIES_ATTRIBUTES,
                keep_remaining_numeric: false,
            },
            SourceKind::CycloneTrackPoint => Self {
                label: aliases::CYCLONE_LABEL,
                value: aliases::CYCLONE_VALUE,
                attributes: CYCLONE_ATTRIBUTES,
                keep_remaining_numeric: true,
            },
            SourceKind::OceanParameter => Self {
                label: aliases::OCEAN_LABEL,
                value: aliases::OCEAN_VALUE,
                attributes: OCEAN_ATTRIBUTES,
                keep_remaining_numeric: false,
            },
        }
    }
}

/// Outcome of normalizing one batch of rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizeReport {
    /// Records that survived normalization, in input order.
    pub records: Vec<CanonicalRecord>,
    /// Rows dropped because no year could be resolved.
    pub dropped: usize,
}

/// Normalize a single row.
///
/// Returns `None` only when no year can be resolved. Missing or invalid
/// coordinates leave the record without a position.
pub fn normalize_row(row: &RawRow, kind: SourceKind) -> Option<CanonicalRecord> {
    let plan = FieldPlan::for_kind(kind);
    let mut consumed: Vec<&str> = Vec::new();

    let year = resolve_year(row, &mut consumed)?;
    let position = resolve_position(row, &mut consumed);

    let label = match plan.label.resolve(row) {
        Some((name, value)) => {
            consumed.push(name);
            value
                .as_text()
                .map(normalize_inline_whitespace)
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
        }
        None => UNKNOWN_LABEL.to_string(),
    };

    let value = plan.value.resolve(row).and_then(|(name, value)| {
        consumed.push(name);
        value.as_f64()
    });

    let mut attributes: IndexMap<AttributeKey, AttributeValue> = IndexMap::new();
    for &key in plan.attributes {
        if let Some((name, raw)) = FieldCandidate::Exact(key).find(row) {
            consumed.push(name);
            if let Some(value) = attribute_value(raw) {
                attributes.insert(key.to_string(), value);
            }
        }
    }

    if plan.keep_remaining_numeric {
        for (name, raw) in row.fields() {
            if consumed.iter().any(|taken| taken.eq_ignore_ascii_case(name))
                || attributes.contains_key(name)
            {
                continue;
            }
            if let Some(number) = raw.as_f64() {
                attributes.insert(name.to_string(), AttributeValue::Number(number));
            }
        }
    }

    Some(CanonicalRecord {
        source_kind: kind,
        year,
        position,
        label,
        value,
        attributes,
    })
}

/// Normalize a batch of rows, counting drops.
pub fn normalize_rows<'a, I>(rows: I, kind: SourceKind) -> NormalizeReport
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut report = NormalizeReport::default();
    for row in rows {
        match normalize_row(row, kind) {
            Some(record) => report.records.push(record),
            None => report.dropped += 1,
        }
    }
    debug!(
        source_kind = %kind,
        kept = report.records.len(),
        dropped = report.dropped,
        "normalized row batch"
    );
    report
}

/// Explicit numeric year first, then the calendar year of a date field.
fn resolve_year<'a>(row: &'a RawRow, consumed: &mut Vec<&'a str>) -> Option<Year> {
    if let Some((name, value)) = aliases::YEAR.resolve(row) {
        consumed.push(name);
        if let Some(year) = value.as_f64().and_then(explicit_year) {
            return Some(year);
        }
    }
    let (name, value) = aliases::DATE.resolve(row)?;
    consumed.push(name);
    value.as_text().and_then(|text| year_from_date_str(&text))
}

fn resolve_position<'a>(row: &'a RawRow, consumed: &mut Vec<&'a str>) -> Option<GeoPoint> {
    let lat = aliases::LATITUDE.resolve(row).and_then(|(name, value)| {
        consumed.push(name);
        value.as_f64()
    });
    let lon = aliases::LONGITUDE.resolve(row).and_then(|(name, value)| {
        consumed.push(name);
        value.as_f64()
    });
    match (lat, lon) {
        (Some(lat), Some(lon))
            if lat.abs() <= MAX_ABS_LATITUDE && lon.abs() <= MAX_ABS_LONGITUDE =>
        {
            Some(GeoPoint { lat, lon })
        }
        _ => None,
    }
}

fn attribute_value(raw: &RawValue) -> Option<AttributeValue> {
    if let Some(number) = raw.as_f64() {
        return Some(AttributeValue::Number(number));
    }
    let text = raw.as_text()?;
    let text = text.trim();
    (!text.is_empty()).then(|| AttributeValue::Text(text.to_string()))
}
