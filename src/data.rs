use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::PipelineError;
use crate::types::{AttributeKey, Label, Year};

/// Which raw feed a record originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Species occurrence records (OBIS-style exports and APIs).
    Fisheries,
    /// Cyclone track points and seasonal cyclone-frequency rows.
    CycloneTrackPoint,
    /// Gridded ocean parameters (SST, chlorophyll-a, salinity).
    OceanParameter,
}

impl SourceKind {
    /// All kinds in canonical order.
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Fisheries,
        SourceKind::CycloneTrackPoint,
        SourceKind::OceanParameter,
    ];

    /// Wire name used in exports and manifests.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Fisheries => "fisheries",
            SourceKind::CycloneTrackPoint => "cyclone-track-point",
            SourceKind::OceanParameter => "ocean-parameter",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| PipelineError::Configuration(format!("unknown source kind '{value}'")))
    }
}

/// Auxiliary attribute value carried by a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Finite numeric attribute (pressure, depth, per-category counts).
    Number(f64),
    /// Free-form text attribute (season, dataset name).
    Text(String),
}

impl AttributeValue {
    /// Numeric view of the attribute.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(value) => Some(*value),
            AttributeValue::Text(_) => None,
        }
    }

    /// Text view of the attribute.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Number(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(value) => write!(f, "{value}"),
            AttributeValue::Text(text) => f.write_str(text),
        }
    }
}

/// A validated geographic position (both coordinates present and in range).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in decimal degrees, `[-180, 180]`.
    pub lon: f64,
}

/// Uniform representation of one observation after normalization.
///
/// Coordinates are held as a single optional [`GeoPoint`] so a record can
/// never carry a latitude without a longitude.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Originating feed.
    pub source_kind: SourceKind,
    /// Calendar year of the observation.
    pub year: Year,
    /// Validated position, when both coordinates resolved.
    pub position: Option<GeoPoint>,
    /// Species name, cyclone name, or parameter name.
    pub label: Label,
    /// Numeric payload; `None` means "counts as one occurrence".
    pub value: Option<f64>,
    /// Auxiliary fields. Equality ignores insertion order.
    pub attributes: IndexMap<AttributeKey, AttributeValue>,
}

impl CanonicalRecord {
    /// Latitude, if the record has a position.
    pub fn latitude(&self) -> Option<f64> {
        self.position.map(|point| point.lat)
    }

    /// Longitude, if the record has a position.
    pub fn longitude(&self) -> Option<f64> {
        self.position.map(|point| point.lon)
    }

    /// Contribution of this record to a temporal total.
    pub fn weight(&self) -> f64 {
        self.value.unwrap_or(1.0)
    }

    /// Look up a text attribute.
    pub fn text_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_text)
    }

    /// Look up a numeric attribute.
    pub fn numeric_attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(AttributeValue::as_f64)
    }
}

/// One `(year, total)` sample of a temporal aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Year key; unique within one series.
    pub year: Year,
    /// Plain sum of values (or occurrence count) for that year.
    pub total: f64,
}

/// Aggregate of records sharing a rounded `(lat, lon)` cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialCluster {
    /// Rounded cell latitude.
    pub lat: f64,
    /// Rounded cell longitude.
    pub lon: f64,
    /// Number of contributing records (always at least 1).
    pub count: usize,
    /// Deduplicated labels seen in the cell, sorted.
    pub labels: BTreeSet<Label>,
}

/// One aligned `(x, y)` pair for scatter/correlation analysis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSample {
    /// Value from the driving series.
    pub x: f64,
    /// Value from the response series, `0` when the year is missing there.
    pub y: f64,
    /// Shared year key.
    pub year: Year,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_round_trips_wire_names() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(
            "Cyclone-Track-Point".parse::<SourceKind>().unwrap(),
            SourceKind::CycloneTrackPoint
        );
        assert!(matches!(
            "storms".parse::<SourceKind>(),
            Err(PipelineError::Configuration(msg)) if msg.contains("storms")
        ));
    }

    #[test]
    fn record_equality_ignores_attribute_order() {
        let mut left = CanonicalRecord {
            source_kind: SourceKind::CycloneTrackPoint,
            year: 2019,
            position: None,
            label: "Fani".into(),
            value: Some(115.0),
            attributes: IndexMap::new(),
        };
        let mut right = left.clone();
        left.attributes
            .insert("pressure".into(), AttributeValue::Number(932.0));
        left.attributes
            .insert("season".into(), AttributeValue::Text("Monsoon".into()));
        right
            .attributes
            .insert("season".into(), AttributeValue::Text("Monsoon".into()));
        right
            .attributes
            .insert("pressure".into(), AttributeValue::Number(932.0));
        assert_eq!(left, right);
        assert_eq!(left.text_attribute("season"), Some("Monsoon"));
        assert_eq!(left.numeric_attribute("pressure"), Some(932.0));
        assert_eq!(left.numeric_attribute("season"), None);
    }

    #[test]
    fn weight_defaults_to_one_occurrence() {
        let record = CanonicalRecord {
            source_kind: SourceKind::Fisheries,
            year: 2005,
            position: Some(GeoPoint { lat: 9.9, lon: 76.3 }),
            label: "Rastrelliger kanagurta".into(),
            value: None,
            attributes: IndexMap::new(),
        };
        assert_eq!(record.weight(), 1.0);
        assert_eq!(record.latitude(), Some(9.9));
        assert_eq!(record.longitude(), Some(76.3));
    }
}
