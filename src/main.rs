use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use pageview_charts::{draw_bar_plot, draw_box_plot, draw_line_plot, load_file, remove_outliers};

/// Data file read when no path is given on the command line.
const DEFAULT_DATA_FILE: &str = "fcc-forum-pageviews.csv";

fn main() -> Result<()> {
    env_logger::init();

    let data_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));
    let out_dir = Path::new(".");

    let series = load_file(&data_path)?;
    let cleaned = remove_outliers(&series)
        .with_context(|| format!("cleaning {}", data_path.display()))?;
    info!(
        "Kept {} of {} records inside [{:.1}, {:.1}]",
        cleaned.len(),
        series.len(),
        cleaned.bounds().low,
        cleaned.bounds().high
    );

    let line = draw_line_plot(&cleaned, out_dir).context("drawing line plot")?;
    let bar = draw_bar_plot(&cleaned, out_dir).context("drawing bar plot")?;
    let boxes = draw_box_plot(&cleaned, out_dir).context("drawing box plot")?;

    for path in [&line.path, &bar.path, &boxes.path] {
        println!("{}", path.display());
    }
    Ok(())
}
