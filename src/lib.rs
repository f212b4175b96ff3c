//! Outlier-filtered visual summaries of a daily page-view series.
//!
//! ```no_run
//! use std::path::Path;
//! use pageview_charts::{charts, data};
//!
//! # fn main() -> anyhow::Result<()> {
//! let series = data::loader::load_file(Path::new("fcc-forum-pageviews.csv"))?;
//! let cleaned = data::filter::remove_outliers(&series)?;
//! charts::draw_line_plot(&cleaned, Path::new("."))?;
//! charts::draw_bar_plot(&cleaned, Path::new("."))?;
//! charts::draw_box_plot(&cleaned, Path::new("."))?;
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub mod charts;
pub mod color;
pub mod data;

pub use charts::{draw_bar_plot, draw_box_plot, draw_line_plot, ChartError, RenderOptions};
pub use data::filter::{remove_outliers, FilterError, PercentileBounds};
pub use data::loader::load_file;
pub use data::model::{CleanedSeries, MonthlyAggregate, Record, RecordError, Series};
