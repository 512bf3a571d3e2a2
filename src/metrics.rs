use serde::Serialize;

use crate::data::CorrelationSample;

/// Display-ready statistics for a set of aligned samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub count: usize,
    pub r: f64,
    pub mean_x: f64,
    pub mean_y: f64,
}

/// Pearson correlation of aligned samples using population moments.
///
/// Returns NaN for fewer than two samples or when either axis has zero
/// variance.
pub fn pearson(samples: &[CorrelationSample]) -> f64 {
    if samples.len() < 2 {
        return f64::NAN;
    }
    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|sample| sample.x).sum::<f64>() / n;
    let mean_y = samples.iter().map(|sample| sample.y).sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for sample in samples {
        let dx = sample.x - mean_x;
        let dy = sample.y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (covariance / n) / ((var_x / n).sqrt() * (var_y / n).sqrt())
}

/// Sample count, Pearson r, and axis means. Means are NaN when empty.
pub fn correlation_summary(samples: &[CorrelationSample]) -> CorrelationSummary {
    let count = samples.len();
    let n = count as f64;
    let (sum_x, sum_y) = samples
        .iter()
        .fold((0.0, 0.0), |(sx, sy), sample| (sx + sample.x, sy + sample.y));
    let (mean_x, mean_y) = if count == 0 {
        (f64::NAN, f64::NAN)
    } else {
        (sum_x / n, sum_y / n)
    };
    CorrelationSummary {
        count,
        r: pearson(samples),
        mean_x,
        mean_y,
    }
}
