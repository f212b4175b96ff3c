use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use log::info;
use plotters::prelude::*;
use serde::Serialize;

use super::{output_path, padded_range, ChartError, RenderOptions, Result, LINE_PLOT_FILE};
use crate::data::model::CleanedSeries;

pub const LINE_TITLE: &str = "Daily freeCodeCamp Forum Page Views 5/2016-12/2019";

/// What [`draw_line_plot`] rendered.
#[derive(Debug, Clone, Serialize)]
pub struct LineChart {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    /// One point per record, in date order.
    pub points: Vec<(NaiveDate, f64)>,
    pub path: PathBuf,
}

impl LineChart {
    /// Smallest and largest plotted value.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().map(|(_, v)| *v);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// First and last plotted date.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }
}

/// Draw the cleaned series as one connected line and save it as
/// `line_plot.png` inside `out_dir`.
pub fn draw_line_plot(series: &CleanedSeries, out_dir: &Path) -> Result<LineChart> {
    draw_line_plot_with(series, out_dir, &RenderOptions::default())
}

/// [`draw_line_plot`] with explicit render options.
pub fn draw_line_plot_with(
    series: &CleanedSeries,
    out_dir: &Path,
    options: &RenderOptions,
) -> Result<LineChart> {
    if series.is_empty() {
        return Err(ChartError::EmptySeries);
    }

    let chart = LineChart {
        title: LINE_TITLE,
        x_label: "Date",
        y_label: "Page Views",
        points: series.records().iter().map(|r| (r.date, r.value)).collect(),
        path: output_path(out_dir, LINE_PLOT_FILE)?,
    };

    render(&chart, options)?;
    info!("Wrote line chart ({} points) to {}", chart.points.len(), chart.path.display());
    Ok(chart)
}

fn date_axis(chart: &LineChart) -> Range<NaiveDate> {
    // Non-empty is checked by the caller.
    let (first, last) = chart
        .date_range()
        .unwrap_or((NaiveDate::MIN, NaiveDate::MIN));
    if first < last {
        first..last
    } else {
        first..first + Days::new(1)
    }
}

fn render(chart: &LineChart, options: &RenderOptions) -> Result<()> {
    let root = BitMapBackend::new(&chart.path, options.line_size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let y_range = padded_range(chart.points.iter().map(|(_, v)| *v), false);

    let mut ctx = ChartBuilder::on(&root)
        .caption(chart.title, (options.font, 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(date_axis(chart), y_range)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    ctx.configure_mesh()
        .x_desc(chart.x_label)
        .y_desc(chart.y_label)
        .x_labels(12)
        .x_label_formatter(&|d| d.format("%Y-%m").to_string())
        .y_label_formatter(&|v| format!("{v:.0}"))
        .bold_line_style(BLUE.mix(0.25))
        .light_line_style(TRANSPARENT)
        .label_style((options.font, 16))
        .axis_desc_style((options.font, 20))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    ctx.draw_series(LineSeries::new(chart.points.iter().copied(), &RED))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    Ok(())
}
