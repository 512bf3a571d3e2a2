//! Flat CSV export of records plus the active filter.
//!
//! Layout (a compatibility contract with downstream consumers):
//!
//! ```text
//! label,latitude,longitude,year,sourceKind
//! <one row per record>
//!
//! filter,value
//! species,<value>
//! category,<value>
//! season,<value>
//! yearMin,<value>
//! yearMax,<value>
//! ```

use std::io::{self, Write};

use crate::constants::export::{RECORD_HEADER, SUMMARY_HEADER};
use crate::data::CanonicalRecord;
use crate::errors::PipelineError;
use crate::filter::FilterState;

fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

/// Write the export for `records` and `filter` to `out`.
///
/// Missing coordinates are written as empty cells.
pub fn write_export<'a, W, I>(
    mut out: W,
    records: I,
    filter: &FilterState,
) -> Result<(), PipelineError>
where
    W: Write,
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    {
        let mut writer = csv_writer(&mut out);
        writer.write_record(RECORD_HEADER)?;
        for record in records {
            let latitude = record.latitude().map(|lat| lat.to_string());
            let longitude = record.longitude().map(|lon| lon.to_string());
            let year = record.year.to_string();
            writer.write_record([
                record.label.as_str(),
                latitude.as_deref().unwrap_or(""),
                longitude.as_deref().unwrap_or(""),
                year.as_str(),
                record.source_kind.as_str(),
            ])?;
        }
        writer.flush()?;
    }
    out.write_all(b"\n")?;
    {
        let mut writer = csv_writer(&mut out);
        writer.write_record(SUMMARY_HEADER)?;
        for (name, value) in filter.resolved_parameters() {
            writer.write_record([name, value.as_str()])?;
        }
        writer.flush()?;
    }
    out.flush()?;
    Ok(())
}

/// Render the export to a string.
pub fn export_csv<'a, I>(records: I, filter: &FilterState) -> Result<String, PipelineError>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let mut buffer = Vec::new();
    write_export(&mut buffer, records, filter)?;
    let text = String::from_utf8(buffer)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeoPoint, SourceKind};
    use indexmap::IndexMap;

    fn fish(label: &str, position: Option<GeoPoint>) -> CanonicalRecord {
        CanonicalRecord {
            source_kind: SourceKind::Fisheries,
            year: 2005,
            position,
            label: label.into(),
            value: None,
            attributes: IndexMap::new(),
        }
    }

    #[test]
    fn export_matches_contract_layout() {
        let records = vec![
            fish(
                "Rastrelliger kanagurta",
                Some(GeoPoint { lat: 9.9, lon: 76.3 }),
            ),
            fish("Thunnus albacares", None),
        ];
        let filter = FilterState::all().with_year_range((1900, 2021));
        let text = export_csv(&records, &filter).unwrap();
        assert_eq!(
            text,
            "label,latitude,longitude,year,sourceKind\n\
             Rastrelliger kanagurta,9.9,76.3,2005,fisheries\n\
             Thunnus albacares,,,2005,fisheries\n\
             \n\
             filter,value\n\
             species,All\n\
             category,All\n\
             season,All\n\
             yearMin,1900\n\
             yearMax,2021\n"
        );
    }

    #[test]
    fn labels_with_commas_are_quoted_and_empty_export_keeps_summary() {
        let records = vec![fish("Sardinella, unidentified", None)];
        let text = export_csv(&records, &FilterState::all()).unwrap();
        assert!(text.contains("\"Sardinella, unidentified\",,,2005,fisheries\n"));

        let empty = export_csv(&Vec::<CanonicalRecord>::new(), &FilterState::all()).unwrap();
        assert!(empty.starts_with("label,latitude,longitude,year,sourceKind\n\nfilter,value\n"));
    }
}
