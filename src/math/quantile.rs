//! Percentiles with linear interpolation between order statistics.
//!
//! This is the "R-7" definition (also NumPy's default): for probability `p`
//! over `n` sorted values the rank is `h = (n - 1) p`, and the result
//! interpolates between `x[floor(h)]` and `x[floor(h) + 1]`.

/// Percentile of `values` at probability `p` in `[0, 1]`.
///
/// Returns `None` for empty input, an out-of-range `p`, or any non-finite value.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(percentile_sorted(&sorted, p))
}

/// Percentile of already-sorted, finite, non-empty `sorted`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    if lo >= n - 1 {
        return sorted[n - 1];
    }
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_linear_interpolation() {
        let v = [15.0, 20.0, 35.0, 40.0, 50.0];
        assert_eq!(percentile(&v, 0.0), Some(15.0));
        assert_eq!(percentile(&v, 1.0), Some(50.0));
        assert_eq!(percentile(&v, 0.5), Some(35.0));
        // h = 4 * 0.4 = 1.6 -> 20 + 0.6 * 15
        let p40 = percentile(&v, 0.4).unwrap();
        assert!((p40 - 29.0).abs() < 1e-12);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let a = [3.0, 1.0, 4.0, 1.5, 9.0, 2.6];
        let mut b = a;
        b.reverse();
        assert_eq!(percentile(&a, 0.025), percentile(&b, 0.025));
        assert_eq!(percentile(&a, 0.975), percentile(&b, 0.975));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[1.0], 1.5), None);
        assert_eq!(percentile(&[1.0, f64::NAN], 0.5), None);
        assert_eq!(percentile(&[7.0], 0.3), Some(7.0));
    }
}
