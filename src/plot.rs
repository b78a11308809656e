//! # Offline Plot
//!
//! Batch consumer of a finished (or still growing) CSV log: one subplot per
//! logged column against time, rendered to SVG.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use plotters::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{MonitorError, Result};
use crate::record::TIME_FIELD;
use crate::telemetry::timestamp::{parse_timestamp, FILE_EXTENSION};

/// Header written for the time column by older loggers
const LEGACY_TIME_HEADER: &str = "Time []";

const SUBPLOT_WIDTH: u32 = 1024;
const SUBPLOT_HEIGHT: u32 = 320;

/// One logged column
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

/// Parsed log file
#[derive(Debug, Clone, PartialEq)]
pub struct LogData {
    pub start: Option<NaiveDateTime>,
    pub series: Vec<Series>,
}

impl LogData {
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).max().unwrap_or(0)
    }
}

fn is_time_header(header: &str) -> bool {
    let header = header.trim();
    header == TIME_FIELD || header == LEGACY_TIME_HEADER
}

/// Load a CSV log
///
/// Rows whose time does not parse (for example a row cut short by a crash)
/// are skipped, as are empty or non-numeric cells.
///
/// # Errors
///
/// Returns error if the file cannot be read or has no time column
pub fn load_log(path: &Path) -> Result<LogData> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    let time_index = headers
        .iter()
        .position(is_time_header)
        .ok_or_else(|| MonitorError::Plot(format!("{} has no Time column", path.display())))?;

    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != time_index)
        .map(|(index, name)| (index, name.to_string()))
        .collect();

    let mut series: Vec<Series> = columns
        .iter()
        .map(|(_, name)| Series {
            name: name.clone(),
            points: Vec::new(),
        })
        .collect();
    let mut start = None;

    for (row_number, row) in reader.records().enumerate() {
        let row = row?;
        let Some(time) = row.get(time_index).and_then(|text| parse_timestamp(text).ok()) else {
            warn!("Skipping row {}: unreadable time", row_number + 2);
            continue;
        };
        start.get_or_insert(time);

        for ((index, _), target) in columns.iter().zip(series.iter_mut()) {
            if let Some(value) = row.get(*index).and_then(|cell| cell.trim().parse::<f64>().ok()) {
                target.points.push((time, value));
            }
        }
    }

    debug!("Loaded {} columns from {}", series.len(), path.display());
    Ok(LogData { start, series })
}

/// Newest `<prefix>_*.csv` file; `prefix` may include a directory
///
/// Timestamped names sort chronologically, so the lexicographic maximum is
/// the most recent run.
pub fn latest_log(prefix: &str) -> Result<PathBuf> {
    let prefix_path = Path::new(prefix);
    let dir = match prefix_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let stem = prefix_path
        .file_name()
        .map(|name| format!("{}_", name.to_string_lossy()))
        .ok_or_else(|| MonitorError::Plot(format!("invalid file prefix '{}'", prefix)))?;
    let extension = format!(".{}", FILE_EXTENSION);

    let mut newest: Option<PathBuf> = None;
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !name.starts_with(&stem) || !name.ends_with(&extension) {
            continue;
        }
        if newest.as_ref().map_or(true, |current| path > *current) {
            newest = Some(path);
        }
    }

    newest.ok_or_else(|| {
        MonitorError::Plot(format!("no {}*{} files in {}", stem, extension, dir.display()))
    })
}

fn padded_range(min: f64, max: f64) -> std::ops::Range<f64> {
    if (max - min).abs() < f64::EPSILON {
        (min - 1.0)..(max + 1.0)
    } else {
        let pad = (max - min) * 0.05;
        (min - pad)..(max + pad)
    }
}

fn plot_error<E: std::fmt::Display>(e: E) -> MonitorError {
    MonitorError::Plot(e.to_string())
}

/// Render one stacked subplot per series into an SVG file
///
/// The x axis is seconds elapsed since the first logged row.
pub fn render_svg(data: &LogData, output: &Path) -> Result<()> {
    let start = data
        .start
        .ok_or_else(|| MonitorError::Plot("log has no samples".to_string()))?;
    if data.series.is_empty() {
        return Err(MonitorError::Plot("log has no value columns".to_string()));
    }

    let elapsed = |time: &NaiveDateTime| (*time - start).num_milliseconds() as f64 / 1000.0;
    let x_max = data
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|(time, _)| elapsed(time)))
        .fold(0.0_f64, f64::max);
    let x_label = format!("Time since {} [s]", start.format("%Y-%m-%d %H:%M:%S"));

    let height = SUBPLOT_HEIGHT * data.series.len() as u32;
    let root = SVGBackend::new(output, (SUBPLOT_WIDTH, height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let areas = root.split_evenly((data.series.len(), 1));
    for (area, series) in areas.iter().zip(&data.series) {
        let (y_min, y_max) = series
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| (lo.min(*v), hi.max(*v)));
        let y_range = if series.points.is_empty() {
            0.0..1.0
        } else {
            padded_range(y_min, y_max)
        };

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(padded_range(0.0, x_max), y_range)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc(x_label.as_str())
            .y_desc(series.name.as_str())
            .draw()
            .map_err(plot_error)?;

        chart
            .draw_series(LineSeries::new(
                series.points.iter().map(|(time, value)| (elapsed(time), *value)),
                &BLUE,
            ))
            .map_err(plot_error)?;
    }

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Load `input` and render it; the default output is `input` with `.svg`
pub fn plot_file(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let data = load_log(input)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("svg"));

    render_svg(&data, &output)?;
    info!(
        "Plotted {} series ({} samples) from {} to {}",
        data.series.len(),
        data.sample_count(),
        input.display(),
        output.display()
    );
    Ok(output)
}
