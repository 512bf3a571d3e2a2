use std::collections::BTreeSet;

use oceansense::aggregate::{ClusterOptions, aggregate_by_space, aggregate_by_year};
use oceansense::correlate::correlate;
use oceansense::data::{CorrelationSample, SeriesPoint, SourceKind, SpatialCluster};
use oceansense::filter::{FilterState, RecordPredicate};
use oceansense::normalize::{normalize_row, normalize_rows};
use oceansense::source::row_view::RawRow;

fn fisheries_row(pairs: &[(&str, &str)]) -> RawRow {
    RawRow::from_text_pairs(pairs.iter().copied())
}

fn mixed_rows() -> Vec<RawRow> {
    vec![
        fisheries_row(&[
            ("scientificName", "Rastrelliger kanagurta"),
            ("decimalLatitude", "9.9"),
            ("decimalLongitude", "76.3"),
            ("eventDate", "2005-06-01"),
        ]),
        fisheries_row(&[
            ("scientificName", "Thunnus albacares"),
            ("decimalLatitude", "9.9"),
            ("decimalLongitude", "76.3"),
            ("year", "2006"),
        ]),
        fisheries_row(&[
            ("scientificName", "Sardinella longiceps"),
            ("decimalLatitude", "11.25"),
            ("decimalLongitude", "75.77"),
            ("eventDate", "2006-01-15T00:00:00Z"),
        ]),
        fisheries_row(&[("scientificName", "Thunnus albacares"), ("eventDate", "undated")]),
        fisheries_row(&[
            ("scientificName", "Thunnus albacares"),
            ("decimalLatitude", "200"),
            ("decimalLongitude", "76.3"),
            ("year", "2007"),
        ]),
    ]
}

#[test]
fn end_to_end_fisheries_example() {
    let rows = vec![
        fisheries_row(&[
            ("scientificName", "Rastrelliger kanagurta"),
            ("decimalLatitude", "9.9"),
            ("decimalLongitude", "76.3"),
            ("eventDate", "2005-06-01"),
        ]),
        fisheries_row(&[
            ("scientificName", "Thunnus albacares"),
            ("decimalLatitude", "bad"),
            ("decimalLongitude", "76.3"),
            ("year", "2005"),
        ]),
    ];
    let report = normalize_rows(&rows, SourceKind::Fisheries);
    assert_eq!(report.dropped, 0);
    assert_eq!(report.records.len(), 2);
    assert!(report.records.iter().all(|record| record.year == 2005));
    assert!(report.records[1].position.is_none());

    let filter = FilterState::all();
    assert_eq!(
        aggregate_by_year(&report.records, &filter),
        vec![SeriesPoint {
            year: 2005,
            total: 2.0
        }]
    );
    assert_eq!(
        aggregate_by_space(&report.records, &filter, ClusterOptions::default()),
        vec![SpatialCluster {
            lat: 9.9,
            lon: 76.3,
            count: 1,
            labels: BTreeSet::from(["Rastrelliger kanagurta".to_string()]),
        }]
    );
}

#[test]
fn normalization_only_drops_yearless_rows() {
    let rows = mixed_rows();
    let report = normalize_rows(&rows, SourceKind::Fisheries);
    assert!(report.records.len() <= rows.len());
    assert_eq!(report.records.len() + report.dropped, rows.len());
    assert_eq!(report.dropped, 1);
    assert!(
        report
            .records
            .iter()
            .all(|record| (1000..=9999).contains(&record.year))
    );
    // Out-of-range latitude keeps the record but loses the position.
    assert_eq!(report.records[3].year, 2007);
    assert!(report.records[3].position.is_none());
}

#[test]
fn aggregation_is_deterministic() {
    let records = normalize_rows(&mixed_rows(), SourceKind::Fisheries).records;
    let filter = FilterState::all().with_year_range((2000, 2010));
    assert_eq!(
        aggregate_by_year(&records, &filter),
        aggregate_by_year(&records, &filter)
    );
    assert_eq!(
        aggregate_by_space(&records, &filter, ClusterOptions::default()),
        aggregate_by_space(&records, &filter, ClusterOptions::default())
    );
    assert_eq!(
        normalize_rows(&mixed_rows(), SourceKind::Fisheries),
        normalize_rows(&mixed_rows(), SourceKind::Fisheries)
    );
}

#[test]
fn series_total_matches_filtered_count() {
    let records = normalize_rows(&mixed_rows(), SourceKind::Fisheries).records;
    for filter in [
        FilterState::all(),
        FilterState::all().with_species("Thunnus albacares"),
        FilterState::all().with_year_range((2006, 2006)),
        FilterState::all().with_year_range((2010, 2000)),
    ] {
        let total: f64 = aggregate_by_year(&records, &filter)
            .iter()
            .map(|point| point.total)
            .sum();
        let expected = records.iter().filter(|record| filter.matches(record)).count();
        assert_eq!(total, expected as f64);

        let series = aggregate_by_year(&records, &filter);
        assert!(series.windows(2).all(|pair| pair[0].year < pair[1].year));
    }
}

#[test]
fn cluster_counts_match_positioned_records_and_respect_cap() {
    let records = normalize_rows(&mixed_rows(), SourceKind::Fisheries).records;
    let filter = FilterState::all();
    let clusters = aggregate_by_space(&records, &filter, ClusterOptions::default());
    let clustered: usize = clusters.iter().map(|cluster| cluster.count).sum();
    let positioned = records
        .iter()
        .filter(|record| filter.matches(record) && record.position.is_some())
        .count();
    assert_eq!(clustered, positioned);
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].count, 2);

    let capped = aggregate_by_space(&records, &filter, ClusterOptions::default().with_cap(1));
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0], clusters[0]);

    let coarse = aggregate_by_space(
        &records,
        &filter,
        ClusterOptions::default().with_precision(0),
    );
    assert_eq!(coarse.len(), 2);
    assert_eq!(coarse[0].lat, 10.0);
}

#[test]
fn join_is_driven_by_the_first_series() {
    let a = [
        SeriesPoint {
            year: 2001,
            total: 5.0,
        },
        SeriesPoint {
            year: 2002,
            total: 3.0,
        },
    ];
    let b = [SeriesPoint {
        year: 2002,
        total: 7.0,
    }];
    assert_eq!(
        correlate(&a, &b, (2000, 2010)),
        vec![
            CorrelationSample {
                x: 5.0,
                y: 0.0,
                year: 2001
            },
            CorrelationSample {
                x: 3.0,
                y: 7.0,
                year: 2002
            },
        ]
    );
    assert_eq!(correlate(&b, &a, (2000, 2010)).len(), 1);
}

#[test]
fn lowercase_aliases_resolve_identically() {
    let camel = fisheries_row(&[
        ("scientificName", "Thunnus albacares"),
        ("decimalLatitude", "9.9"),
        ("decimalLongitude", "76.3"),
        ("eventDate", "2005-06-01"),
    ]);
    let lower = fisheries_row(&[
        ("scientificname", "Thunnus albacares"),
        ("decimallatitude", "9.9"),
        ("decimallongitude", "76.3"),
        ("eventdate", "2005-06-01"),
    ]);
    assert_eq!(
        normalize_row(&camel, SourceKind::Fisheries),
        normalize_row(&lower, SourceKind::Fisheries)
    );
}
