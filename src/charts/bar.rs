use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{debug, info};
use plotters::prelude::*;
use serde::Serialize;

use super::{
    category_label, category_range, output_path, padded_range, ChartError, RenderOptions, Result,
    BAR_PLOT_FILE,
};
use crate::calendar::{month_name, year_month};
use crate::color::generate_palette;
use crate::data::model::{CleanedSeries, MonthlyAggregate};
use crate::data::stats::mean;

pub const LEGEND_TITLE: &str = "Months";

/// Share of a year's slot covered by its bars; the rest is the gap between years.
const GROUP_WIDTH: f64 = 0.8;

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Mean value per `(year, month)` present in the series, ordered by year then
/// month. Months without records produce no entry.
pub fn monthly_averages(series: &CleanedSeries) -> Vec<MonthlyAggregate> {
    let mut groups: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for r in series.records() {
        groups.entry(year_month(r.date)).or_default().push(r.value);
    }

    groups
        .into_iter()
        .filter_map(|((year, month), values)| {
            Some(MonthlyAggregate {
                year,
                month,
                month_name: month_name(month)?,
                mean_value: mean(&values)?,
            })
        })
        .collect()
}

/// Distinct months present in `aggregates`, in calendar order.
pub fn month_order(aggregates: &[MonthlyAggregate]) -> Vec<u32> {
    aggregates
        .iter()
        .map(|a| a.month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

/// What [`draw_bar_plot`] rendered.
#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub legend_title: &'static str,
    /// Year axis, ascending; year `years[i]` sits at x position `i`.
    pub years: Vec<i32>,
    /// Month numbers in legend and dodge order.
    pub months: Vec<u32>,
    /// Legend entries, one full month name per entry of `months`.
    pub legend: Vec<&'static str>,
    /// One bar per record.
    pub bars: Vec<MonthlyAggregate>,
    pub path: PathBuf,
}

impl BarChart {
    /// Horizontal extent of the bar for `aggregate`, or `None` if its year or
    /// month is not on this chart.
    pub fn bar_span(&self, aggregate: &MonthlyAggregate) -> Option<(f64, f64)> {
        let year_idx = self.years.iter().position(|&y| y == aggregate.year)?;
        let month_idx = self.months.iter().position(|&m| m == aggregate.month)?;
        let width = GROUP_WIDTH / self.months.len() as f64;
        let left = year_idx as f64 - GROUP_WIDTH / 2.0 + month_idx as f64 * width;
        Some((left, left + width))
    }
}

/// Draw monthly averages grouped by year, one coloured bar per month, and
/// save them as `bar_plot.png` inside `out_dir`.
pub fn draw_bar_plot(series: &CleanedSeries, out_dir: &Path) -> Result<BarChart> {
    draw_bar_plot_with(series, out_dir, &RenderOptions::default())
}

/// [`draw_bar_plot`] with explicit render options.
pub fn draw_bar_plot_with(
    series: &CleanedSeries,
    out_dir: &Path,
    options: &RenderOptions,
) -> Result<BarChart> {
    if series.is_empty() {
        return Err(ChartError::EmptySeries);
    }

    let bars = monthly_averages(series);
    let months = month_order(&bars);
    let years: Vec<i32> = bars
        .iter()
        .map(|a| a.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    debug!(
        "{} monthly aggregates over {} years and {} months",
        bars.len(),
        years.len(),
        months.len()
    );

    let chart = BarChart {
        x_label: "Years",
        y_label: "Average Page Views",
        legend_title: LEGEND_TITLE,
        legend: months.iter().filter_map(|&m| month_name(m)).collect(),
        years,
        months,
        bars,
        path: output_path(out_dir, BAR_PLOT_FILE)?,
    };

    render(&chart, options)?;
    info!("Wrote bar chart ({} bars) to {}", chart.bars.len(), chart.path.display());
    Ok(chart)
}

fn render(chart: &BarChart, options: &RenderOptions) -> Result<()> {
    let root = BitMapBackend::new(&chart.path, options.bar_size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let year_labels: Vec<String> = chart.years.iter().map(|y| y.to_string()).collect();
    let y_range = padded_range(chart.bars.iter().map(|a| a.mean_value), true);

    let mut ctx = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(category_range(chart.years.len()), y_range)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(chart.x_label)
        .y_desc(chart.y_label)
        .x_labels(chart.years.len())
        .x_label_formatter(&|x| category_label(&year_labels, *x))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .label_style((options.font, 16))
        .axis_desc_style((options.font, 20))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let palette = generate_palette(chart.months.len());

    // One series per month so each gets a single legend entry, in calendar order.
    for (month_idx, (&month, &name)) in chart.months.iter().zip(&chart.legend).enumerate() {
        let color = palette[month_idx];
        let rects: Vec<Rectangle<(f64, f64)>> = chart
            .bars
            .iter()
            .filter(|a| a.month == month)
            .filter_map(|a| {
                let (left, right) = chart.bar_span(a)?;
                Some(Rectangle::new(
                    [(left, 0.0), (right, a.mean_value)],
                    color.filled(),
                ))
            })
            .collect();

        ctx.draw_series(rects)
            .map_err(|e| ChartError::Drawing(e.to_string()))?
            .label(name)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
            });
    }

    // Legend sits below its title in the upper left corner.
    ctx.configure_series_labels()
        .position(SeriesLabelPosition::Coordinate(10, 30))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((options.font, 14))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let (x_px, y_px) = ctx.plotting_area().get_pixel_range();
    root.draw(&Text::new(
        chart.legend_title,
        (x_px.start + 14, y_px.start + 10),
        (options.font, 16),
    ))
    .map_err(|e| ChartError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::PercentileBounds;
    use crate::data::model::Record;
    use chrono::NaiveDate;

    /// Wrap records without filtering so tests control every value.
    fn unfiltered(rows: &[(i32, u32, u32, f64)]) -> CleanedSeries {
        let records = rows
            .iter()
            .map(|&(y, m, d, v)| Record::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), v))
            .collect();
        CleanedSeries::new(
            records,
            PercentileBounds {
                low: f64::NEG_INFINITY,
                high: f64::INFINITY,
            },
        )
    }

    #[test]
    fn mean_per_year_and_month() {
        let series = unfiltered(&[
            (2017, 3, 1, 10.0),
            (2017, 3, 2, 20.0),
            (2017, 3, 3, 30.0),
            (2017, 4, 1, 7.0),
            (2018, 3, 1, 2.0),
        ]);
        let aggs = monthly_averages(&series);
        assert_eq!(aggs.len(), 3);
        assert_eq!(
            aggs[0],
            MonthlyAggregate {
                year: 2017,
                month: 3,
                month_name: "March",
                mean_value: 20.0
            }
        );
        assert_eq!((aggs[1].year, aggs[1].month, aggs[1].mean_value), (2017, 4, 7.0));
        assert_eq!((aggs[2].year, aggs[2].month, aggs[2].mean_value), (2018, 3, 2.0));
    }

    #[test]
    fn month_order_is_numeric_not_alphabetical_or_first_seen() {
        let series = unfiltered(&[
            (2016, 12, 1, 1.0),
            (2017, 3, 1, 1.0),
            (2017, 1, 1, 1.0),
        ]);
        let aggs = monthly_averages(&series);
        assert_eq!(month_order(&aggs), vec![1, 3, 12]);
    }

    #[test]
    fn absent_months_are_not_zero_filled() {
        let series = unfiltered(&[(2016, 5, 9, 4.0), (2016, 12, 31, 8.0)]);
        let aggs = monthly_averages(&series);
        assert_eq!(aggs.len(), 2);
        assert!(aggs.iter().all(|a| a.mean_value > 0.0));
    }

    #[test]
    fn dodged_bars_keep_their_month_slot() {
        let series = unfiltered(&[
            (2016, 1, 1, 1.0),
            (2016, 2, 1, 1.0),
            (2017, 2, 1, 1.0),
        ]);
        let bars = monthly_averages(&series);
        let chart = BarChart {
            x_label: "Years",
            y_label: "Average Page Views",
            legend_title: LEGEND_TITLE,
            years: vec![2016, 2017],
            months: month_order(&bars),
            legend: vec!["January", "February"],
            bars: bars.clone(),
            path: PathBuf::new(),
        };

        let (l0, r0) = chart.bar_span(&bars[0]).unwrap();
        assert!((l0 + 0.4).abs() < 1e-9);
        assert!((r0 - 0.0).abs() < 1e-9);
        // February of 2017 sits in the second slot even though January is missing.
        let (l2, r2) = chart.bar_span(&bars[2]).unwrap();
        assert!((l2 - 1.0).abs() < 1e-9);
        assert!((r2 - 1.4).abs() < 1e-9);
    }

    #[test]
    fn legend_lists_present_months_in_calendar_order() {
        let series = unfiltered(&[
            (2016, 12, 5, 30.0),
            (2017, 3, 5, 20.0),
            (2017, 1, 5, 10.0),
            (2017, 12, 5, 40.0),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let chart = draw_bar_plot(&series, dir.path()).unwrap();

        assert_eq!(chart.legend, vec!["January", "March", "December"]);
        assert_eq!(chart.legend_title, "Months");
        assert_eq!(chart.years, vec![2016, 2017]);
        assert_eq!(chart.bars.len(), 4);
        assert!(dir.path().join(BAR_PLOT_FILE).is_file());
    }
}
