//! Chart builders for the cleaned page-view series.
//!
//! Each builder reads the same [`CleanedSeries`](crate::data::model::CleanedSeries),
//! writes one PNG with a fixed file name into the requested directory, and
//! returns a description of what it plotted so callers can inspect it.
//!
//! Rendering uses the [`plotters`] bitmap backend.

use std::ops::Range;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod bar;
pub mod boxplot;
pub mod line;

pub use bar::{draw_bar_plot, draw_bar_plot_with, month_order, monthly_averages, BarChart};
pub use boxplot::{draw_box_plot, draw_box_plot_with, BoxPanel, BoxPlotFigure};
pub use line::{draw_line_plot, draw_line_plot_with, LineChart};

/// File written by the line chart builder.
pub const LINE_PLOT_FILE: &str = "line_plot.png";
/// File written by the bar chart builder.
pub const BAR_PLOT_FILE: &str = "bar_plot.png";
/// File written by the box plot builder.
pub const BOX_PLOT_FILE: &str = "box_plot.png";

/// Errors that can occur during chart generation
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Cannot draw a chart of an empty series")]
    EmptySeries,

    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to prepare output location: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, ChartError>;

// ---------------------------------------------------------------------------
// Render options
// ---------------------------------------------------------------------------

/// Figure sizes in pixels and the font family used for all text.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub line_size: (u32, u32),
    pub bar_size: (u32, u32),
    pub box_size: (u32, u32),
    pub font: &'static str,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            line_size: (2000, 600),
            bar_size: (1200, 700),
            box_size: (1500, 600),
            font: "sans-serif",
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Create `dir` if needed and return the path of `file_name` inside it.
pub(crate) fn output_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(file_name))
}

/// Y-axis range covering `values` with a little headroom. A flat series gets
/// a unit-wide window around its value.
pub(crate) fn padded_range(values: impl Iterator<Item = f64>, floor_at_zero: bool) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { max.abs().max(1.0) * 0.5 };
    let low = if floor_at_zero { 0.0 } else { min - pad };
    low..max + pad
}

/// X-axis range for `n` categorical slots centred on `0..n`.
pub(crate) fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Label of the slot nearest `x`, blank between slots.
pub(crate) fn category_label(labels: &[String], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    labels.get(nearest as usize).cloned().unwrap_or_default()
}
