use std::collections::HashMap;

use crate::data::{CorrelationSample, SeriesPoint};
use crate::types::{Year, YearRange};

/// Align `series_b` onto the years of `series_a` inside `year_range`.
///
/// `series_a` drives the join: every A year in range yields one sample, and
/// `y` is B's total for that year or `0` when B has no point there. B years
/// absent from A are ignored. An inverted range is swapped. Output is sorted
/// ascending by year.
pub fn correlate(
    series_a: &[SeriesPoint],
    series_b: &[SeriesPoint],
    year_range: YearRange,
) -> Vec<CorrelationSample> {
    let (min, max) = if year_range.0 <= year_range.1 {
        year_range
    } else {
        (year_range.1, year_range.0)
    };
    let lookup: HashMap<Year, f64> = series_b
        .iter()
        .map(|point| (point.year, point.total))
        .collect();
    let mut samples: Vec<CorrelationSample> = series_a
        .iter()
        .filter(|point| point.year >= min && point.year <= max)
        .map(|point| CorrelationSample {
            x: point.total,
            y: lookup.get(&point.year).copied().unwrap_or(0.0),
            year: point.year,
        })
        .collect();
    samples.sort_by_key(|sample| sample.year);
    samples
}
