//! CSV and JSON payloads to [`RawRow`]s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

use crate::constants::decode::{
    ENVELOPE_KEYS, OCEAN_PARAMETERS, PARAMETER_FIELD, TRACK_KEY, VALUE_FIELD,
};
use crate::data::SourceKind;
use crate::errors::PipelineError;
use crate::source::row_view::{RawRow, RawValue};

/// Payload encoding of a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Header-row CSV.
    Csv,
    /// JSON array, envelope object, or single object.
    Json,
}

impl DataFormat {
    /// Infer the format from a file extension (`.csv`, `.json`, `.geojson`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(DataFormat::Csv)
        } else if ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("geojson") {
            Some(DataFormat::Json)
        } else {
            None
        }
    }
}

/// Rows decoded from one payload plus the number of entries that could not
/// be turned into rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodeReport {
    /// Decoded rows in payload order.
    pub rows: Vec<RawRow>,
    /// CSV records with the wrong field count, or non-object JSON entries.
    pub malformed: usize,
}

/// Decode header-row CSV text.
pub fn rows_from_csv(text: &str) -> Result<DecodeReport, PipelineError> {
    rows_from_csv_reader(text.as_bytes())
}

/// Decode header-row CSV from any reader.
///
/// Headers and cells are trimmed. Records whose length differs from the
/// header, or that are not valid UTF-8, are counted as malformed and
/// skipped. Header names are decoded lossily.
pub fn rows_from_csv_reader<R: Read>(reader: R) -> Result<DecodeReport, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect();
    let mut report = DecodeReport::default();
    for record in reader.byte_records() {
        let record = record?;
        if record.len() != headers.len() {
            report.malformed += 1;
            continue;
        }
        let Ok(record) = csv::StringRecord::from_byte_record(record) else {
            report.malformed += 1;
            continue;
        };
        report.rows.push(RawRow::from_text_pairs(
            headers.iter().map(String::as_str).zip(record.iter()),
        ));
    }
    Ok(report)
}

/// Decode a JSON payload for records of `kind`.
///
/// Accepts an array of objects, an envelope object holding such an array
/// under one of the well-known keys, or a single object. GeoJSON features
/// contribute their `properties` plus point coordinates.
pub fn rows_from_json(value: &Value, kind: SourceKind) -> DecodeReport {
    let mut report = DecodeReport::default();
    for item in json_items(value) {
        let Some(object) = item.as_object() else {
            report.malformed += 1;
            continue;
        };
        let object = lift_feature(object);
        match kind {
            SourceKind::CycloneTrackPoint => expand_track(&object, &mut report),
            SourceKind::OceanParameter => expand_parameters(&object, &mut report),
            SourceKind::Fisheries => report.rows.push(RawRow::from_json_object(&object)),
        }
    }
    report
}

/// Parse JSON text and decode it with [`rows_from_json`].
pub fn rows_from_json_str(text: &str, kind: SourceKind) -> Result<DecodeReport, PipelineError> {
    rows_from_json_slice(text.as_bytes(), kind)
}

/// Parse raw JSON bytes and decode them with [`rows_from_json`].
pub fn rows_from_json_slice(bytes: &[u8], kind: SourceKind) -> Result<DecodeReport, PipelineError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(rows_from_json(&value, kind))
}

fn json_items(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(object) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(std::slice::from_ref(value)),
        _ => std::slice::from_ref(value),
    }
}

/// Flatten a GeoJSON feature into a plain object; other objects pass through.
fn lift_feature(object: &Map<String, Value>) -> Map<String, Value> {
    let Some(properties) = object.get("properties").and_then(Value::as_object) else {
        return object.clone();
    };
    let mut lifted = properties.clone();
    let coordinates = object
        .get("geometry")
        .filter(|geometry| geometry.get("type").and_then(Value::as_str) == Some("Point"))
        .and_then(|geometry| geometry.get("coordinates"))
        .and_then(Value::as_array);
    if let Some([lon, lat, ..]) = coordinates.map(Vec::as_slice) {
        lifted
            .entry("longitude")
            .or_insert_with(|| lon.clone());
        lifted.entry("latitude").or_insert_with(|| lat.clone());
    }
    lifted
}

/// One row per track point; points inherit the storm's scalar fields.
fn expand_track(object: &Map<String, Value>, report: &mut DecodeReport) {
    let Some(track) = object.get(TRACK_KEY).and_then(Value::as_array) else {
        report.rows.push(RawRow::from_json_object(object));
        return;
    };
    let shared = RawRow::from_json_object(object);
    for point in track {
        let Some(point) = point.as_object() else {
            report.malformed += 1;
            continue;
        };
        let mut row = RawRow::from_json_object(point);
        for (name, value) in shared.fields() {
            row.push_if_absent(name, value.clone());
        }
        report.rows.push(row);
    }
}

/// One row per ocean parameter present on the object.
fn expand_parameters(object: &Map<String, Value>, report: &mut DecodeReport) {
    let present: Vec<(&str, &Value)> = OCEAN_PARAMETERS
        .iter()
        .filter_map(|parameter| {
            object
                .iter()
                .find(|(key, value)| key.eq_ignore_ascii_case(parameter) && !value.is_null())
                .map(|(_, value)| (*parameter, value))
        })
        .collect();
    if present.is_empty() {
        report.rows.push(RawRow::from_json_object(object));
        return;
    }
    let shared: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| {
            !OCEAN_PARAMETERS
                .iter()
                .any(|parameter| key.eq_ignore_ascii_case(parameter))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let shared = RawRow::from_json_object(&shared);
    for (parameter, value) in present {
        let mut row = RawRow::new()
            .with_field(PARAMETER_FIELD, parameter)
            .with_field(VALUE_FIELD, RawValue::from_json(value));
        for (name, value) in shared.fields() {
            row.push_if_absent(name, value.clone());
        }
        report.rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_rows_are_trimmed_and_ragged_records_counted() {
        let text = " Year , TOTAL ,D\n1999, 5 ,3\n2000,4\n\n2001,6,2\n";
        let report = rows_from_csv(text).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.rows[0].get("Year"), Some(&RawValue::from("1999")));
        assert_eq!(report.rows[0].get("TOTAL"), Some(&RawValue::from("5")));
        assert_eq!(report.rows[1].get("D"), Some(&RawValue::from("2")));
    }

    #[test]
    fn csv_with_only_header_yields_no_rows() {
        let report = rows_from_csv("scientificName,eventDate\n").unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.malformed, 0);
    }

    #[test]
    fn invalid_utf8_row_is_skipped_not_fatal() {
        let bytes: &[u8] =
            b"scientificName,year\nThunnus albacares,2005\nSardinella p\xe9rez,2006\nAuxis thazard,2007\n";
        let report = rows_from_csv_reader(bytes).unwrap();
        assert_eq!(report.malformed, 1);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(
            report.rows[1].get("scientificName"),
            Some(&RawValue::from("Auxis thazard"))
        );
    }

    #[test]
    fn invalid_utf8_header_is_decoded_lossily() {
        let bytes: &[u8] = b"scientificName,n\xe9\nThunnus albacares,1\n";
        let report = rows_from_csv_reader(bytes).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.malformed, 0);
        assert_eq!(report.rows[0].get("n\u{FFFD}"), Some(&RawValue::from("1")));
    }

    #[test]
    fn json_envelope_and_non_objects() {
        let value = json!({
            "total": 3,
            "results": [
                { "scientificName": "Thunnus albacares", "year": 2005 },
                "oops",
                { "scientificName": "Sardinella longiceps", "year": 2006 }
            ]
        });
        let report = rows_from_json(&value, SourceKind::Fisheries);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.malformed, 1);
    }

    #[test]
    fn single_object_is_one_row() {
        let value = json!({ "scientificName": "Thunnus albacares", "year": 2005 });
        let report = rows_from_json(&value, SourceKind::Fisheries);
        assert_eq!(report.rows.len(), 1);
    }

    #[test]
    fn cyclone_track_points_inherit_storm_fields() {
        let value = json!([{
            "name": "Amphan",
            "basin": "NIO",
            "track": [
                { "lat": 10.4, "lon": 87.0, "datetime": "2020-05-16T00:00:00Z", "wind_speed": 25 },
                { "lat": 21.6, "lon": 88.2, "datetime": "2020-05-20T12:00:00Z", "wind_speed": 85, "basin": "BoB" },
                42
            ]
        }]);
        let report = rows_from_json(&value, SourceKind::CycloneTrackPoint);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.rows[0].get("name"), Some(&RawValue::from("Amphan")));
        assert_eq!(report.rows[0].get("basin"), Some(&RawValue::from("NIO")));
        assert_eq!(report.rows[1].get("basin"), Some(&RawValue::from("BoB")));
        assert_eq!(report.rows[1].get("wind_speed"), Some(&RawValue::Number(85.0)));
    }

    #[test]
    fn ocean_parameters_split_into_rows() {
        let value = json!({
            "data": [
                { "lat": 8.5, "lon": 76.9, "date": "2021-03-01", "sst": 29.1, "chl": 0.4, "salinity": null }
            ]
        });
        let report = rows_from_json(&value, SourceKind::OceanParameter);
        assert_eq!(report.rows.len(), 2);
        let first = &report.rows[0];
        assert_eq!(first.get(PARAMETER_FIELD), Some(&RawValue::from("sst")));
        assert_eq!(first.get(VALUE_FIELD), Some(&RawValue::Number(29.1)));
        assert_eq!(first.get("lat"), Some(&RawValue::Number(8.5)));
        assert!(first.get("chl").is_none());
        assert_eq!(report.rows[1].get(PARAMETER_FIELD), Some(&RawValue::from("chl")));
    }

    #[test]
    fn geojson_features_lift_properties_and_point() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [76.3, 9.9] },
                "properties": { "scientificName": "Rastrelliger kanagurta", "year": 2005 }
            }]
        });
        let report = rows_from_json(&value, SourceKind::Fisheries);
        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.get("latitude"), Some(&RawValue::Number(9.9)));
        assert_eq!(row.get("longitude"), Some(&RawValue::Number(76.3)));
        assert_eq!(
            row.get("scientificName"),
            Some(&RawValue::from("Rastrelliger kanagurta"))
        );
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(
            DataFormat::from_path(Path::new("a/b/Monsoon.CSV")),
            Some(DataFormat::Csv)
        );
        assert_eq!(
            DataFormat::from_path(Path::new("obis.geojson")),
            Some(DataFormat::Json)
        );
        assert_eq!(DataFormat::from_path(Path::new("notes.txt")), None);
    }
}
