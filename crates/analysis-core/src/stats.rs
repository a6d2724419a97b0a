//! Small statistics helpers shared by the analysis crates.

use statrs::statistics::Statistics;

/// Sample standard deviation (n - 1 denominator). Needs at least two points.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    Some(data.iter().std_dev())
}

/// Period-over-period fractional change. Pairs whose base is zero or
/// non-finite are skipped rather than producing infinities.
pub fn pct_change(data: &[f64]) -> Vec<f64> {
    data.windows(2)
        .filter_map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if prev == 0.0 || !prev.is_finite() || !curr.is_finite() {
                None
            } else {
                Some(curr / prev - 1.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_std_dev() {
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // sample variance = 32 / 7
        assert_relative_eq!(std_dev(&data).unwrap(), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(std_dev(&[]).is_none());
        assert!(std_dev(&[1.0]).is_none());
    }

    #[test]
    fn test_pct_change_skips_zero_base() {
        let returns = pct_change(&[100.0, 110.0, 0.0, 5.0, 10.0]);
        assert_eq!(returns.len(), 3);
        assert_relative_eq!(returns[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(returns[1], -1.0);
        assert_relative_eq!(returns[2], 1.0);
    }
}
