/// Data layer: core types, loading, outlier removal and statistics.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Series (sorted by date)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  keep values inside the 2.5–97.5 percentile band
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ CleanedSeries │  shared read-only by every chart builder
///   └───────────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
