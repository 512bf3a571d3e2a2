use crate::fields::{FieldAliases, FieldCandidate};

/// Constants used by record normalization and canonical labels.
pub mod normalize {
    /// Label assigned when no identity field resolves.
    pub const UNKNOWN_LABEL: &str = "Unknown";
    /// Smallest explicit year accepted from a numeric year field.
    pub const MIN_YEAR: i32 = 1000;
    /// Largest explicit year accepted from a numeric year field.
    pub const MAX_YEAR: i32 = 9999;
    /// Maximum absolute latitude accepted as a valid coordinate.
    pub const MAX_ABS_LATITUDE: f64 = 90.0;
    /// Maximum absolute longitude accepted as a valid coordinate.
    pub const MAX_ABS_LONGITUDE: f64 = 180.0;
}

/// Constants used by temporal and spatial aggregation.
pub mod aggregate {
    /// Decimal digits kept when rounding coordinates into cluster keys.
    pub const DEFAULT_CLUSTER_PRECISION: u32 = 4;
    /// Maximum number of clusters returned for map rendering.
    pub const DEFAULT_CLUSTER_CAP: usize = 2000;
    /// Number of labels returned by default from `top_labels`.
    pub const DEFAULT_TOP_LABELS: usize = 10;
}

/// Constants used by filter parsing.
pub mod filter {
    /// Wildcard value that disables a filter dimension.
    pub const ALL: &str = "All";
    /// Legacy wildcard spellings treated the same as [`ALL`].
    pub const ALL_ALIASES: &[&str] = &["All", "All Species", "All Categories", "All Seasons"];
}

/// Well-known attribute keys written by the normalizer.
pub mod attributes {
    /// Season a cyclone record belongs to (`Monsoon`, `Winter`, ...).
    pub const SEASON: &str = "season";
    /// Category attribute carried by some fisheries and cyclone rows.
    pub const CATEGORY: &str = "category";
}

/// Constants used by JSON decoding.
pub mod decode {
    /// Envelope keys searched (in order) for a record array.
    pub const ENVELOPE_KEYS: &[&str] = &["results", "data", "records", "features"];
    /// Key holding the per-point track array of a cyclone object.
    pub const TRACK_KEY: &str = "track";
    /// Ocean parameters split into separate rows.
    pub const OCEAN_PARAMETERS: &[&str] = &["sst", "chl", "salinity"];
    /// Synthetic field holding the parameter name of a split ocean row.
    pub const PARAMETER_FIELD: &str = "parameter";
    /// Synthetic field holding the reading of a split ocean row.
    pub const VALUE_FIELD: &str = "value";
    /// Separator used when flattening nested JSON objects into field names.
    pub const NESTED_SEPARATOR: char = '.';
}

/// Constants used by the CSV export format.
pub mod export {
    /// Column header of the record block, in contract order.
    pub const RECORD_HEADER: [&str; 5] = ["label", "latitude", "longitude", "year", "sourceKind"];
    /// Column header of the trailing filter summary block.
    pub const SUMMARY_HEADER: [&str; 2] = ["filter", "value"];
}

/// Ordered candidate field names for every logical field.
pub mod aliases {
    use super::{FieldAliases, FieldCandidate};

    /// Latitude candidates, most specific first.
    pub const LATITUDE: FieldAliases = FieldAliases::new(
        "latitude",
        &[
            FieldCandidate::Exact("decimalLatitude"),
            FieldCandidate::Exact("decimallatitude"),
            FieldCandidate::Exact("decLat"),
            FieldCandidate::Exact("latitude"),
            FieldCandidate::Leaf("lat"),
        ],
    );
    /// Longitude candidates, most specific first.
    pub const LONGITUDE: FieldAliases = FieldAliases::new(
        "longitude",
        &[
            FieldCandidate::Exact("decimalLongitude"),
            FieldCandidate::Exact("decimallongitude"),
            FieldCandidate::Exact("decLong"),
            FieldCandidate::Exact("decLon"),
            FieldCandidate::Exact("longitude"),
            FieldCandidate::Leaf("lon"),
            FieldCandidate::Leaf("lng"),
        ],
    );
    /// Explicit numeric year candidates.
    pub const YEAR: FieldAliases = FieldAliases::new(
        "year",
        &[
            FieldCandidate::Exact("year"),
            FieldCandidate::Exact("Year"),
            FieldCandidate::Exact("YEAR"),
        ],
    );
    /// Date-like candidates a calendar year can be extracted from.
    pub const DATE: FieldAliases = FieldAliases::new(
        "date",
        &[
            FieldCandidate::Exact("eventDate"),
            FieldCandidate::Exact("eventdate"),
            FieldCandidate::Exact("datetime"),
            FieldCandidate::Exact("date"),
            FieldCandidate::Exact("time"),
            FieldCandidate::Exact("timestamp"),
            FieldCandidate::Exact("ISO_TIME"),
        ],
    );
    /// Fisheries identity candidates.
    pub const FISHERIES_LABEL: FieldAliases = FieldAliases::new(
        "label",
        &[
            FieldCandidate::Exact("scientificName"),
            FieldCandidate::Exact("scientificname"),
            FieldCandidate::Exact("sciname"),
            FieldCandidate::Exact("species"),
        ],
    );
    /// Cyclone identity candidates.
    pub const CYCLONE_LABEL: FieldAliases = FieldAliases::new(
        "label",
        &[
            FieldCandidate::Exact("name"),
            FieldCandidate::Exact("Name"),
            FieldCandidate::Exact("NAME"),
            FieldCandidate::Exact("storm"),
            FieldCandidate::Exact("season"),
        ],
    );
    /// Ocean-parameter identity candidates.
    pub const OCEAN_LABEL: FieldAliases = FieldAliases::new(
        "label",
        &[
            FieldCandidate::Exact("parameter"),
            FieldCandidate::Exact("variable"),
            FieldCandidate::Exact("dataset"),
        ],
    );
    /// Fisheries carry no numeric payload; every occurrence counts once.
    pub const FISHERIES_VALUE: FieldAliases = FieldAliases::new("value", &[]);
    /// Cyclone payload candidates: track wind speed, then seasonal totals.
    pub const CYCLONE_VALUE: FieldAliases = FieldAliases::new(
        "value",
        &[
            FieldCandidate::Exact("wind_speed"),
            FieldCandidate::Exact("windSpeed"),
            FieldCandidate::Exact("wind"),
            FieldCandidate::Exact("WMO_WIND"),
            FieldCandidate::Exact("USA_WIND"),
            FieldCandidate::Contains("total"),
        ],
    );
    /// Ocean-parameter payload candidates.
    pub const OCEAN_VALUE: FieldAliases = FieldAliases::new(
        "value",
        &[
            FieldCandidate::Exact("value"),
            FieldCandidate::Exact("reading"),
        ],
    );
}
