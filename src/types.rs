/// Identifier for the source that produced a batch of rows.
/// Examples: `obis_fisheries`, `imd_monsoon`, `ocean_grid`
pub type SourceId = String;
/// Calendar year used as the shared temporal key.
/// Examples: `1891`, `2005`, `2021`
pub type Year = i32;
/// Free-form identity string carried by a canonical record.
/// Examples: `Rastrelliger kanagurta`, `Fani`, `sst`
pub type Label = String;
/// Name of a raw input field as it appears in a CSV header or JSON key.
/// Examples: `decimalLatitude`, `track.wind_speed`, `TOTAL`
pub type FieldName = String;
/// Key of an auxiliary record attribute.
/// Examples: `pressure`, `season`, `datasetName`
pub type AttributeKey = String;
/// Category name taken from the species registry.
/// Examples: `Pelagic`, `Demersal`, `Crustacean`
pub type CategoryName = String;
/// Season name attached to cyclone records.
/// Examples: `Monsoon`, `Post-Monsoon`, `Winter`
pub type SeasonName = String;
/// Inclusive `(min, max)` year bounds.
/// Example: `(1891, 2021)`
pub type YearRange = (Year, Year);
