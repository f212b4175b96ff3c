use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{
    Array, AsArray, Date32Array, Date64Array, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{Record, Series};

/// Name of the date column in every supported format.
pub const DATE_COLUMN: &str = "date";
/// Name of the value column in every supported format.
pub const VALUE_COLUMN: &str = "value";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a page-view series from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `date` and `value` columns (others ignored)
/// * `.json`    – `[{ "date": "2016-05-09", "value": 1201 }, ...]`
/// * `.parquet` – `date` (string, date or timestamp) and `value` (numeric) columns
pub fn load_file(path: &Path) -> Result<Series> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    let series = Series::from_records(records);
    warn_on_duplicate_dates(&series);
    info!("Loaded {} records from {}", series.len(), path.display());
    Ok(series)
}

fn warn_on_duplicate_dates(series: &Series) {
    let duplicates = series
        .records()
        .windows(2)
        .filter(|w| w[0].date == w[1].date)
        .count();
    if duplicates > 0 {
        warn!("{duplicates} records share a date with their predecessor");
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, `date` and `value` located by
/// name.  All other columns are ignored.
fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let date_idx = headers
        .iter()
        .position(|h| h.trim() == DATE_COLUMN)
        .context("CSV missing 'date' column")?;
    let value_idx = headers
        .iter()
        .position(|h| h.trim() == VALUE_COLUMN)
        .context("CSV missing 'value' column")?;

    let mut records = Vec::new();

    // Line 1 is the header; the fallback only applies when the reader has no position.
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV line {}", row_no + 2))?;
        let line = row.position().map_or(row_no as u64 + 2, |p| p.line());

        let date_text = row.get(date_idx).unwrap_or("");
        let date = parse_date(date_text)
            .with_context(|| format!("CSV line {line}: '{date_text}' is not a date"))?;

        let value_text = row.get(value_idx).unwrap_or("").trim();
        let value = value_text
            .parse::<f64>()
            .with_context(|| format!("CSV line {line}: '{value_text}' is not a number"))?;

        records.push(Record::checked(date, value).with_context(|| format!("CSV line {line}"))?);
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// A `date` cell in a JSON record: ISO text, or epoch milliseconds as written
/// by `df.to_json(orient='records')`.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDate {
    Text(String),
    EpochMillis(i64),
}

#[derive(Deserialize)]
struct JsonRecord {
    date: JsonDate,
    value: f64,
}

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "date": "2016-05-09", "value": 1201 },
///   { "date": 1462838400000, "value": 2329 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<JsonRecord> = serde_json::from_str(&text).context("parsing JSON")?;

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let n = i + 1;
            let date = match row.date {
                JsonDate::Text(s) => parse_date(&s)
                    .with_context(|| format!("Record {n}: '{s}' is not a date"))?,
                JsonDate::EpochMillis(ms) => DateTime::from_timestamp_millis(ms)
                    .map(|dt| dt.date_naive())
                    .with_context(|| format!("Record {n}: timestamp {ms} out of range"))?,
            };
            Record::checked(date, row.value).with_context(|| format!("Record {n}"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing a page-view series.
///
/// Expected schema:
/// - `date`: Utf8, Date32, Date64 or Timestamp (any unit)
/// - `value`: Int32, Int64, Float32 or Float64
/// - Any other columns are ignored
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let date_idx = schema
            .index_of(DATE_COLUMN)
            .map_err(|_| anyhow!("Parquet file missing 'date' column"))?;
        let value_idx = schema
            .index_of(VALUE_COLUMN)
            .map_err(|_| anyhow!("Parquet file missing 'value' column"))?;

        let date_col = batch.column(date_idx);
        let value_col = batch.column(value_idx);

        for row in 0..batch.num_rows() {
            let row_no = records.len() + 1;
            let date = extract_date(date_col, row)
                .with_context(|| format!("Row {row_no}: failed to read 'date'"))?;
            let value = extract_f64(value_col, row)
                .with_context(|| format!("Row {row_no}: failed to read 'value'"))?;
            records.push(Record::checked(date, value).with_context(|| format!("Row {row_no}"))?);
        }
    }

    Ok(records)
}

// -- Parquet / Arrow helpers --

fn extract_date(col: &Arc<dyn Array>, row: usize) -> Result<NaiveDate> {
    if col.is_null(row) {
        bail!("null date");
    }

    let date = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            return parse_date(arr.value(row));
        }
        DataType::LargeUtf8 => return parse_date(col.as_string::<i64>().value(row)),
        DataType::Date32 => col
            .as_any()
            .downcast_ref::<Date32Array>()
            .context("expected Date32Array")?
            .value_as_date(row),
        DataType::Date64 => col
            .as_any()
            .downcast_ref::<Date64Array>()
            .context("expected Date64Array")?
            .value_as_date(row),
        DataType::Timestamp(unit, _) => {
            let raw = match unit {
                TimeUnit::Second => col
                    .as_primitive::<arrow::datatypes::TimestampSecondType>()
                    .value_as_datetime(row),
                TimeUnit::Millisecond => col
                    .as_primitive::<arrow::datatypes::TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => col
                    .as_primitive::<arrow::datatypes::TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => col
                    .as_primitive::<arrow::datatypes::TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            raw.map(|dt| dt.date())
        }
        other => bail!("Expected a string, date or timestamp column, got {other:?}"),
    };

    date.context("date out of range")
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }

    let any = col.as_any();
    if let Some(arr) = any.downcast_ref::<Int64Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
        Ok(f64::from(arr.value(row)))
    } else if let Some(arr) = any.downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
        Ok(f64::from(arr.value(row)))
    } else {
        bail!("Expected a numeric column, got {:?}", col.data_type())
    }
}

// ---------------------------------------------------------------------------
// Shared parsing
// ---------------------------------------------------------------------------

/// Parse `YYYY-MM-DD`, optionally followed by a time of day which is dropped.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .with_context(|| format!("unrecognised date '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_plain_and_timestamped_dates() {
        let expected = NaiveDate::from_ymd_opt(2016, 5, 9).unwrap();
        assert_eq!(parse_date("2016-05-09").unwrap(), expected);
        assert_eq!(parse_date("2016-05-09 13:45:00").unwrap(), expected);
        assert_eq!(parse_date("2016-05-09T00:00:00").unwrap(), expected);
        assert!(parse_date("09/05/2016").is_err());
    }

    #[test]
    fn csv_columns_are_found_by_name_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "views.csv",
            "value,source,date\n50,forum,2016-05-11\n5,forum,2016-05-09\n1000000,forum,2016-05-10\n",
        );
        let series = load_file(&path).unwrap();
        let values: Vec<f64> = series.values().collect();
        assert_eq!(values, vec![5.0, 1_000_000.0, 50.0]);
    }

    #[test]
    fn csv_missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "views.csv", "date,count\n2016-05-09,5\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("'value'"));
    }

    #[test]
    fn csv_bad_date_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "views.csv", "date,value\nyesterday,5\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("yesterday"));
    }

    #[test]
    fn negative_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "views.csv", "date,value\n2016-05-09,-3\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn csv_errors_name_the_file_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "views.csv",
            "date,value\n2016-05-09,5\n2016-05-10,lots\n",
        );
        let msg = format!("{:#}", load_file(&path).unwrap_err());
        assert!(msg.contains("CSV line 3: 'lots' is not a number"), "{msg}");

        let path = write_file(&dir, "views.csv", "date,value\n2016-05-09,NaN\n");
        let msg = format!("{:#}", load_file(&path).unwrap_err());
        assert!(msg.contains("CSV line 2"), "{msg}");
        assert!(msg.contains("not finite"), "{msg}");
    }

    #[test]
    fn json_errors_count_records_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "views.json",
            r#"[{"date": "2016-05-09", "value": 1}, {"date": "2016-05-10", "value": -2}]"#,
        );
        let msg = format!("{:#}", load_file(&path).unwrap_err());
        assert!(msg.contains("Record 2"), "{msg}");
        assert!(msg.contains("negative"), "{msg}");
    }

    #[test]
    fn json_accepts_text_and_epoch_dates() {
        let dir = tempfile::tempdir().unwrap();
        // 1462838400000 ms = 2016-05-10T00:00:00Z
        let path = write_file(
            &dir,
            "views.json",
            r#"[{"date": 1462838400000, "value": 20}, {"date": "2016-05-09", "value": 10}]"#,
        );
        let series = load_file(&path).unwrap();
        let records = series.records();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2016, 5, 9).unwrap());
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2016, 5, 10).unwrap());
        assert_eq!(records[1].value, 20.0);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "views.xlsx", "");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains(".xlsx"));
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(load_file(Path::new("/definitely/not/here.csv")).is_err());
    }

    #[test]
    fn empty_csv_loads_as_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "views.csv", "date,value\n");
        assert!(load_file(&path).unwrap().is_empty());
    }
}
