//! Descriptive statistics shared by the outlier filter and the box plots.
//!
//! Quantiles use linear interpolation between adjacent order statistics
//! (`h = (n - 1) * p`), the default estimator of common dataframe libraries.

use serde::Serialize;

/// Whisker reach in multiples of the interquartile range.
pub const WHISKER_IQR: f64 = 1.5;

/// Sort a copy of `values` ascending.
pub fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// The `p`-th quantile (`p` in `[0, 1]`) of pre-sorted data.
///
/// Returns `None` for empty input or `p` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();

    if j + 1 >= n {
        Some(sorted[n - 1])
    } else {
        Some(sorted[j] + (sorted[j + 1] - sorted[j]) * g)
    }
}

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// ---------------------------------------------------------------------------
// Box-and-whisker summary
// ---------------------------------------------------------------------------

/// Five-number summary plus Tukey whiskers and outlier points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Lowest datum at or above `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Highest datum at or below `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    /// Data beyond the whiskers, ascending.
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    /// Summarise a group of values. `None` for an empty group.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let data = sorted(values.iter().copied());
        let q1 = quantile_sorted(&data, 0.25)?;
        let median = quantile_sorted(&data, 0.5)?;
        let q3 = quantile_sorted(&data, 0.75)?;
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        // The quartiles always lie inside the fences, so at least one datum
        // falls in range on each side.
        let whisker_low = data
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = data
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);

        let outliers = data
            .iter()
            .copied()
            .filter(|&v| v < whisker_low || v > whisker_high)
            .collect();

        Some(BoxSummary {
            count: data.len(),
            min: data[0],
            q1,
            median,
            q3,
            max: data[data.len() - 1],
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_linearly() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&data, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&data, 1.0), Some(5.0));
        assert_eq!(quantile_sorted(&data, 0.5), Some(3.0));
        // h = 4 * 0.1 = 0.4 → 1 + 0.4 * (2 - 1)
        let q = quantile_sorted(&data, 0.1).unwrap();
        assert!((q - 1.4).abs() < 1e-12);
    }

    #[test]
    fn quantile_matches_dataframe_default() {
        // 0..=100 → 2.5 % lands on 2.5, 97.5 % on 97.5
        let data: Vec<f64> = (0..=100).map(f64::from).collect();
        assert!((quantile_sorted(&data, 0.025).unwrap() - 2.5).abs() < 1e-9);
        assert!((quantile_sorted(&data, 0.975).unwrap() - 97.5).abs() < 1e-9);
    }

    #[test]
    fn quantile_rejects_empty_and_out_of_range() {
        assert_eq!(quantile_sorted(&[], 0.5), None);
        assert_eq!(quantile_sorted(&[1.0], 1.5), None);
        assert_eq!(quantile_sorted(&[1.0], -0.1), None);
        assert_eq!(quantile_sorted(&[7.0], 0.3), Some(7.0));
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[10.0, 20.0, 30.0]), Some(20.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn box_summary_without_outliers() {
        let b = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(b.count, 5);
        assert_eq!((b.min, b.q1, b.median, b.q3, b.max), (1.0, 2.0, 3.0, 4.0, 5.0));
        assert_eq!((b.whisker_low, b.whisker_high), (1.0, 5.0));
        assert!(b.outliers.is_empty());
    }

    #[test]
    fn box_summary_flags_points_beyond_whiskers() {
        // q1 = 2, q3 = 4, IQR = 2 → fences at -1 and 7
        let b = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.q1, 2.0);
        assert_eq!(b.q3, 4.0);
        assert_eq!(b.whisker_high, 4.0);
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert_eq!(b.max, 100.0);
    }

    #[test]
    fn single_observation_is_a_degenerate_box() {
        let b = BoxSummary::from_values(&[42.0]).unwrap();
        assert_eq!(b.iqr(), 0.0);
        assert_eq!((b.min, b.median, b.max), (42.0, 42.0, 42.0));
        assert_eq!((b.whisker_low, b.whisker_high), (42.0, 42.0));
        assert!(b.outliers.is_empty());
    }

    #[test]
    fn empty_group_has_no_box() {
        assert!(BoxSummary::from_values(&[]).is_none());
    }
}
