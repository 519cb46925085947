//! Visualization tools for telemetry series.
//!
//! This module provides functions to render channel traces as line plots
//! using the plotters library, mainly for eyeballing a conditioning stage
//! against its input.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::core::series::TimeSeries;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Empty series")]
    EmptySeries,

    #[error("channel index {index} is out of range for a series with {num_channels} channels")]
    ChannelOutOfRange { index: usize, num_channels: usize },
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Default plot width in pixels.
const DEFAULT_WIDTH: u32 = 1920;

/// Default plot height in pixels.
const DEFAULT_HEIGHT: u32 = 1080;

/// Color palette for channel traces.
const TRACE_COLORS: &[(u8, u8, u8)] = &[
    (228, 26, 28),  // Red
    (55, 126, 184), // Blue
    (77, 175, 74),  // Green
    (152, 78, 163), // Purple
    (255, 127, 0),  // Orange
    (166, 86, 40),  // Brown
];

fn check_channel(series: &TimeSeries, index: usize) -> Result<()> {
    if index >= series.num_channels() {
        return Err(VisualizationError::ChannelOutOfRange {
            index,
            num_channels: series.num_channels(),
        });
    }
    Ok(())
}

/// Subsampled `(t, value)` pairs for one channel.
fn trace(series: &TimeSeries, channel: usize, max_points: usize) -> Vec<(f64, f64)> {
    let n = series.len();
    let step = if n > max_points { n / max_points } else { 1 };

    (0..n)
        .step_by(step)
        .map(|i| (series.timestamps[i], series.channels[channel][i]))
        .collect()
}

/// Plot one channel from two series on shared axes and save as PNG.
///
/// Intended for before/after comparison of a conditioning stage, e.g. raw
/// torque under the filtered trace.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image
/// * `before` - Series drawn first (background trace)
/// * `after` - Series drawn on top
/// * `channel` - Channel index to plot from both series
/// * `max_points` - Maximum points per trace (subsamples if exceeded)
pub fn plot_channel_overlay(
    output_path: &Path,
    before: &TimeSeries,
    after: &TimeSeries,
    channel: usize,
    max_points: usize,
) -> Result<()> {
    if before.is_empty() || after.is_empty() {
        return Err(VisualizationError::EmptySeries);
    }
    check_channel(before, channel)?;
    check_channel(after, channel)?;

    let traces = vec![
        trace(before, channel, max_points),
        trace(after, channel, max_points),
    ];
    draw_traces(output_path, &traces)
}

/// Plot several channels of one series on shared axes and save as PNG.
pub fn plot_channels(
    output_path: &Path,
    series: &TimeSeries,
    channels: &[usize],
    max_points: usize,
) -> Result<()> {
    if series.is_empty() || channels.is_empty() {
        return Err(VisualizationError::EmptySeries);
    }
    for &channel in channels {
        check_channel(series, channel)?;
    }

    let traces: Vec<Vec<(f64, f64)>> = channels
        .iter()
        .map(|&channel| trace(series, channel, max_points))
        .collect();
    draw_traces(output_path, &traces)
}

fn draw_traces(output_path: &Path, traces: &[Vec<(f64, f64)>]) -> Result<()> {
    let (x_min, x_max, y_min, y_max) = compute_bounds(traces);
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    let root =
        BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT)).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    for (i, points) in traces.iter().enumerate() {
        let c = TRACE_COLORS[i % TRACE_COLORS.len()];
        let color = RGBColor(c.0, c.1, c.2);

        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
    }

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Compute the bounds (min/max) over all traces.
fn compute_bounds(traces: &[Vec<(f64, f64)>]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for points in traces {
        for &(x, y) in points {
            if x < x_min { x_min = x; }
            if x > x_max { x_max = x; }
            if y < y_min { y_min = y; }
            if y > y_max { y_max = y; }
        }
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}
