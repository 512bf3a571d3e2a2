//! Text and numeric normalization helpers shared by the normalizer and aggregator.

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::with_capacity(text.as_ref().len());
    let mut seen_space = false;
    for ch in text.as_ref().trim().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized
}

/// Parse trimmed text as a finite `f64`.
///
/// `NaN`, infinities, and anything `str::parse` rejects yield `None`.
pub fn parse_finite(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Scale factor for rounding to `precision` decimal digits.
pub fn precision_scale(precision: u32) -> f64 {
    10f64.powi(precision.min(15) as i32)
}

/// Integer grid key of `value` at `precision` decimal digits.
///
/// Rounds half away from zero, so `9.99995` at 4 digits becomes `100000`.
pub fn grid_key(value: f64, precision: u32) -> i64 {
    (value * precision_scale(precision)).round() as i64
}

/// Inverse of [`grid_key`].
pub fn grid_value(key: i64, precision: u32) -> f64 {
    key as f64 / precision_scale(precision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_inline_whitespace_collapses_runs() {
        let input = "  Thunnus\n\n  albacares\t ";
        assert_eq!(normalize_inline_whitespace(input), "Thunnus albacares");
        assert_eq!(normalize_inline_whitespace("   "), "");
    }

    #[test]
    fn parse_finite_rejects_non_finite_and_garbage() {
        assert_eq!(parse_finite(" 76.3 "), Some(76.3));
        assert_eq!(parse_finite("-12"), Some(-12.0));
        assert_eq!(parse_finite("1e3"), Some(1000.0));
        assert_eq!(parse_finite("NaN"), None);
        assert_eq!(parse_finite("inf"), None);
        assert_eq!(parse_finite("bad"), None);
        assert_eq!(parse_finite(""), None);
    }

    #[test]
    fn grid_key_round_trips_at_precision() {
        assert_eq!(grid_key(9.9, 4), 99_000);
        assert_eq!(grid_value(grid_key(9.9, 4), 4), 9.9);
        assert_eq!(grid_key(76.30004, 4), 763_000);
        assert_eq!(grid_key(-10.00006, 4), -100_001);
        assert_eq!(grid_key(12.345, 0), 12);
    }
}
