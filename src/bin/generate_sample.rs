use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Datelike, NaiveDate};
use log::info;
use parquet::arrow::ArrowWriter;

const CSV_OUTPUT: &str = "sample_pageviews.csv";
const PARQUET_OUTPUT: &str = "sample_pageviews.parquet";

/// Seeded noise source: splitmix64 for uniforms, the polar method for
/// normal draws.
struct Noise {
    state: u64,
    spare: Option<f64>,
}

impl Noise {
    fn seeded(seed: u64) -> Self {
        Noise { state: seed, spare: None }
    }

    fn next_bits(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn uniform(&mut self) -> f64 {
        (self.next_bits() >> 11) as f64 * f64::EPSILON / 2.0
    }

    /// Standard normal draw; pairs are generated together and the second is kept.
    fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        loop {
            let u = 2.0 * self.uniform() - 1.0;
            let v = 2.0 * self.uniform() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let scale = (-2.0 * s.ln() / s).sqrt();
                self.spare = Some(v * scale);
                return u * scale;
            }
        }
    }
}

/// Expected views on day `t` (days since start): linear growth plus a yearly
/// swing that peaks in late autumn.
fn expected_views(t: f64, date: NaiveDate) -> f64 {
    let trend = 15_000.0 + 90.0 * t;
    let phase = 2.0 * std::f64::consts::PI * (f64::from(date.ordinal()) - 30.0) / 365.25;
    trend * (1.0 + 0.25 * phase.sin())
}

fn generate(noise: &mut Noise) -> Result<Vec<(NaiveDate, i64)>> {
    let start = NaiveDate::from_ymd_opt(2016, 5, 9).context("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2019, 12, 3).context("invalid end date")?;

    let rows = start
        .iter_days()
        .take_while(|d| *d <= end)
        .enumerate()
        .map(|(i, date)| {
            let base = expected_views(i as f64, date);
            let noisy = base * (1.0 + 0.12 * noise.standard_normal());
            // Occasional traffic spikes and outages for the filter to catch.
            let views = match noise.uniform() {
                p if p < 0.01 => noisy * 8.0,
                p if p < 0.02 => noisy * 0.05,
                _ => noisy,
            };
            (date, views.max(0.0).round() as i64)
        })
        .collect();
    Ok(rows)
}

fn write_csv(rows: &[(NaiveDate, i64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(CSV_OUTPUT).context("creating CSV output")?;
    writer.write_record(["date", "value"])?;
    for (date, value) in rows {
        writer.write_record([date.format("%Y-%m-%d").to_string(), value.to_string()])?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

fn build_batch(rows: &[(NaiveDate, i64)]) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let days: Vec<i32> = rows
        .iter()
        .map(|(date, _)| (*date - epoch).num_days() as i32)
        .collect();
    let values: Vec<i64> = rows.iter().map(|(_, v)| *v).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Date32, false),
        Field::new("value", DataType::Int64, false),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Date32Array::from(days)),
            Arc::new(Int64Array::from(values)),
        ],
    )
    .context("building record batch")
}

fn write_parquet(batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(PARQUET_OUTPUT).context("creating parquet output")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut noise = Noise::seeded(42);
    let rows = generate(&mut noise)?;

    write_csv(&rows)?;
    let batch = build_batch(&rows)?;
    write_parquet(&batch)?;

    let preview = batch.slice(0, batch.num_rows().min(5));
    info!("First rows:\n{}", pretty_format_batches(&[preview])?);

    println!(
        "Wrote {} daily records ({} .. {}) to {CSV_OUTPUT} and {PARQUET_OUTPUT}",
        rows.len(),
        rows.first().map(|(d, _)| d.to_string()).unwrap_or_default(),
        rows.last().map(|(d, _)| d.to_string()).unwrap_or_default(),
    );
    Ok(())
}
