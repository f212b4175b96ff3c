use log::debug;
use serde::Serialize;
use thiserror::Error;

use super::model::{CleanedSeries, Record, Series};
use super::stats::{quantile_sorted, sorted};

// ---------------------------------------------------------------------------
// Percentile band: which values survive outlier removal
// ---------------------------------------------------------------------------

/// Lower percentile of the retained band.
pub const LOW_QUANTILE: f64 = 0.025;
/// Upper percentile of the retained band.
pub const HIGH_QUANTILE: f64 = 0.975;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Cannot compute percentiles of an empty series")]
    EmptySeries,
}

/// Closed interval `[low, high]` of values kept by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileBounds {
    pub low: f64,
    pub high: f64,
}

impl PercentileBounds {
    /// 2.5th and 97.5th percentile of every value in `series`.
    pub fn of(series: &Series) -> Result<Self, FilterError> {
        let data = sorted(series.values());
        let low = quantile_sorted(&data, LOW_QUANTILE).ok_or(FilterError::EmptySeries)?;
        let high = quantile_sorted(&data, HIGH_QUANTILE).ok_or(FilterError::EmptySeries)?;
        Ok(PercentileBounds { low, high })
    }

    /// Both ends inclusive.
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    /// Records inside the band, order preserved. Bounds are not recomputed.
    pub fn retain(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|r| self.contains(r.value))
            .copied()
            .collect()
    }
}

/// Drop records outside the 2.5–97.5 percentile band of the whole series.
///
/// The band is computed once over `series`; the result carries it along so
/// callers never need to recompute it against already-filtered data.
pub fn remove_outliers(series: &Series) -> Result<CleanedSeries, FilterError> {
    let bounds = PercentileBounds::of(series)?;
    let kept = bounds.retain(series.records());

    debug!(
        "Outlier band [{:.2}, {:.2}]: kept {} of {} records",
        bounds.low,
        bounds.high,
        kept.len(),
        series.len()
    );

    Ok(CleanedSeries::new(kept, bounds))
}
