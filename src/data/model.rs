use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::filter::PercentileBounds;

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// A single dated observation (one row of the source table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    /// Page views on `date`; finite and non-negative.
    pub value: f64,
}

impl Record {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Record { date, value }
    }

    /// Build a record, rejecting values a page-view count cannot take.
    pub fn checked(date: NaiveDate, value: f64) -> Result<Self, RecordError> {
        if !value.is_finite() {
            return Err(RecordError::NotFinite { date, value });
        }
        if value < 0.0 {
            return Err(RecordError::Negative { date, value });
        }
        Ok(Record { date, value })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RecordError {
    #[error("value {value} on {date} is not finite")]
    NotFinite { date: NaiveDate, value: f64 },

    #[error("value {value} on {date} is negative")]
    Negative { date: NaiveDate, value: f64 },
}

// ---------------------------------------------------------------------------
// Series – the complete loaded table, sorted by date
// ---------------------------------------------------------------------------

/// The full loaded series, ascending by date.
#[derive(Debug, Clone, Default)]
pub struct Series {
    records: Vec<Record>,
}

impl Series {
    /// Validate every value, then sort by date.
    pub fn try_from_records(records: Vec<Record>) -> Result<Self, RecordError> {
        for r in &records {
            Record::checked(r.date, r.value)?;
        }
        Ok(Self::from_records(records))
    }

    /// Sort the records by date. The sort is stable so duplicate dates keep
    /// their input order. Callers have already checked the values.
    pub(crate) fn from_records(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.date);
        Series { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Values in date order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.value)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CleanedSeries – output of the outlier filter
// ---------------------------------------------------------------------------

/// The series after outlier removal. Only the outlier filter builds one, so
/// every record is inside `bounds`, and date order is kept.
#[derive(Debug, Clone)]
pub struct CleanedSeries {
    records: Vec<Record>,
    bounds: PercentileBounds,
}

impl CleanedSeries {
    pub(crate) fn new(records: Vec<Record>, bounds: PercentileBounds) -> Self {
        CleanedSeries { records, bounds }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The bounds computed over the full, unfiltered series.
    pub fn bounds(&self) -> PercentileBounds {
        self.bounds
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.value)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MonthlyAggregate – one bar of the bar chart
// ---------------------------------------------------------------------------

/// Mean value of one `(year, month)` group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    /// Month number, `1..=12`.
    pub month: u32,
    pub month_name: &'static str,
    pub mean_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn series_is_sorted_by_date() {
        let series = Series::from_records(vec![
            Record::new(day(2017, 1, 3), 3.0),
            Record::new(day(2016, 12, 31), 1.0),
            Record::new(day(2017, 1, 1), 2.0),
        ]);
        let values: Vec<f64> = series.values().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn duplicate_dates_keep_input_order() {
        let series = Series::from_records(vec![
            Record::new(day(2017, 1, 2), 9.0),
            Record::new(day(2017, 1, 1), 5.0),
            Record::new(day(2017, 1, 1), 7.0),
        ]);
        let values: Vec<f64> = series.values().collect();
        assert_eq!(values, vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn empty_series() {
        let series = Series::from_records(Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.len(), 0);
    }

    #[test]
    fn unusable_values_are_rejected_before_sorting() {
        let nan = Series::try_from_records(vec![
            Record::new(day(2017, 1, 1), 5.0),
            Record::new(day(2017, 1, 2), f64::NAN),
        ])
        .unwrap_err();
        assert!(matches!(nan, RecordError::NotFinite { .. }));

        let negative = Series::try_from_records(vec![Record::new(day(2017, 1, 3), -1.0)]).unwrap_err();
        assert_eq!(
            negative,
            RecordError::Negative {
                date: day(2017, 1, 3),
                value: -1.0
            }
        );
        assert_eq!(negative.to_string(), "value -1 on 2017-01-03 is negative");

        let ok = Series::try_from_records(vec![
            Record::new(day(2017, 1, 2), 0.0),
            Record::new(day(2017, 1, 1), 4.0),
        ])
        .unwrap();
        assert_eq!(ok.values().collect::<Vec<_>>(), vec![4.0, 0.0]);
    }
}
