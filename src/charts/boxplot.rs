use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;

use super::{
    category_label, category_range, output_path, padded_range, ChartError, RenderOptions, Result,
    BOX_PLOT_FILE,
};
use crate::calendar::month_abbrevs;
use crate::color::generate_palette;
use crate::data::model::CleanedSeries;
use crate::data::stats::BoxSummary;

pub const YEAR_TITLE: &str = "Year-wise Box Plot (Trend)";
pub const MONTH_TITLE: &str = "Month-wise Box Plot (Seasonality)";

/// Width of a box as a share of its category slot.
const BOX_WIDTH: f64 = 0.6;

/// One box-and-whisker panel.
#[derive(Debug, Clone, Serialize)]
pub struct BoxPanel {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    /// Axis categories in display order; `boxes[i]` belongs to `categories[i]`.
    pub categories: Vec<String>,
    /// `None` for a category without observations: its slot stays on the axis.
    pub boxes: Vec<Option<BoxSummary>>,
}

/// What [`draw_box_plot`] rendered: year panel on the left, month panel on
/// the right, each with its own value scale.
#[derive(Debug, Clone, Serialize)]
pub struct BoxPlotFigure {
    pub year_panel: BoxPanel,
    pub month_panel: BoxPanel,
    pub path: PathBuf,
}

/// One box per calendar year present, ascending.
pub fn year_panel(series: &CleanedSeries) -> BoxPanel {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for r in series.records() {
        by_year
            .entry(r.date.year())
            .or_default()
            .push(r.value);
    }

    let (categories, boxes) = by_year
        .into_iter()
        .map(|(year, values)| (year.to_string(), BoxSummary::from_values(&values)))
        .unzip();

    BoxPanel {
        title: YEAR_TITLE,
        x_label: "Year",
        y_label: "Page Views",
        categories,
        boxes,
    }
}

/// Twelve slots `Jan..Dec` regardless of which months have data.
pub fn month_panel(series: &CleanedSeries) -> BoxPanel {
    let mut by_month: [Vec<f64>; 12] = Default::default();
    for r in series.records() {
        by_month[r.date.month0() as usize].push(r.value);
    }

    BoxPanel {
        title: MONTH_TITLE,
        x_label: "Month",
        y_label: "Page Views",
        categories: month_abbrevs().map(str::to_string).collect(),
        boxes: by_month.iter().map(|v| BoxSummary::from_values(v)).collect(),
    }
}

/// Draw the year-wise and month-wise box plots side by side and save them
/// as `box_plot.png` inside `out_dir`.
pub fn draw_box_plot(series: &CleanedSeries, out_dir: &Path) -> Result<BoxPlotFigure> {
    draw_box_plot_with(series, out_dir, &RenderOptions::default())
}

/// [`draw_box_plot`] with explicit render options.
pub fn draw_box_plot_with(
    series: &CleanedSeries,
    out_dir: &Path,
    options: &RenderOptions,
) -> Result<BoxPlotFigure> {
    if series.is_empty() {
        return Err(ChartError::EmptySeries);
    }

    let figure = BoxPlotFigure {
        year_panel: year_panel(series),
        month_panel: month_panel(series),
        path: output_path(out_dir, BOX_PLOT_FILE)?,
    };

    render(&figure, options)?;
    info!(
        "Wrote box plots ({} years, {} months with data) to {}",
        figure.year_panel.categories.len(),
        figure.month_panel.boxes.iter().flatten().count(),
        figure.path.display()
    );
    Ok(figure)
}

fn render(figure: &BoxPlotFigure, options: &RenderOptions) -> Result<()> {
    let root = BitMapBackend::new(&figure.path, options.box_size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let halves = root.split_evenly((1, 2));
    draw_panel(&halves[0], &figure.year_panel, options)?;
    draw_panel(&halves[1], &figure.month_panel, options)?;

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    panel: &BoxPanel,
    options: &RenderOptions,
) -> Result<()> {
    let present = panel.boxes.iter().flatten();
    let y_range = padded_range(present.flat_map(|b| [b.min, b.max]), false);

    let mut ctx = ChartBuilder::on(area)
        .caption(panel.title, (options.font, 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(75)
        .build_cartesian_2d(category_range(panel.categories.len()), y_range)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(panel.x_label)
        .y_desc(panel.y_label)
        .x_labels(panel.categories.len())
        .x_label_formatter(&|x| category_label(&panel.categories, *x))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .label_style((options.font, 14))
        .axis_desc_style((options.font, 18))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    // The month panel always has twelve slots, so each month keeps its colour.
    let palette = generate_palette(panel.categories.len());

    let mut fills = Vec::new();
    let mut strokes = Vec::new();
    let mut lines = Vec::new();
    let mut points = Vec::new();

    for (idx, summary) in panel.boxes.iter().enumerate() {
        let Some(b) = summary else { continue };
        let x = idx as f64;
        let (left, right) = (x - BOX_WIDTH / 2.0, x + BOX_WIDTH / 2.0);
        let (cap_left, cap_right) = (x - BOX_WIDTH / 4.0, x + BOX_WIDTH / 4.0);
        let frame = BLACK.stroke_width(1);

        fills.push(Rectangle::new([(left, b.q1), (right, b.q3)], palette[idx].filled()));
        strokes.push(Rectangle::new([(left, b.q1), (right, b.q3)], frame));

        let segments = [
            [(x, b.q1), (x, b.whisker_low)],
            [(x, b.q3), (x, b.whisker_high)],
            [(cap_left, b.whisker_low), (cap_right, b.whisker_low)],
            [(cap_left, b.whisker_high), (cap_right, b.whisker_high)],
        ];
        lines.extend(segments.map(|seg| PathElement::new(seg.to_vec(), frame)));
        lines.push(PathElement::new(
            vec![(left, b.median), (right, b.median)],
            BLACK.stroke_width(2),
        ));

        points.extend(b.outliers.iter().map(|&v| Circle::new((x, v), 3, frame)));
    }

    ctx.draw_series(fills)
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    ctx.draw_series(strokes)
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    ctx.draw_series(lines)
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    ctx.draw_series(points)
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    Ok(())
}
