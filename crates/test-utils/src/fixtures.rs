//! Common test fixtures for contour tests.
//!
//! This module provides pre-defined styles and windows that represent
//! common rendering scenarios.

use std::sync::Arc;

use contour_engine::{AxisWindow, ContourStyle, Matrix, WindowedSource};

/// Common stroke colors used to tell draw cycles apart.
pub mod colors {
    pub const BLACK: [u8; 4] = [0, 0, 0, 255];
    pub const RED: [u8; 4] = [255, 0, 0, 255];
    pub const BLUE: [u8; 4] = [0, 0, 255, 255];
    pub const GREEN: [u8; 4] = [0, 160, 0, 255];
}

/// Style drawing exactly one positive level.
pub fn single_level_style(level: f64, color: [u8; 4]) -> ContourStyle {
    ContourStyle {
        base_level: level,
        multiplier: 2.0,
        n_levels: 1,
        positive_color: color,
        draw_negative: false,
        ..ContourStyle::default()
    }
}

/// Geometric style with both polarities, in the given positive color.
pub fn spectrum_style(base_level: f64, n_levels: usize, color: [u8; 4]) -> ContourStyle {
    ContourStyle {
        base_level,
        multiplier: 1.3,
        n_levels,
        positive_color: color,
        negative_color: colors::RED,
        ..ContourStyle::default()
    }
}

/// Source covering the full matrix, mapped one pixel per `pixels` samples.
pub fn full_view_source(
    name: &str,
    data: Matrix,
    chunk_size: usize,
    pixels_per_sample: f64,
) -> WindowedSource {
    let (rows, cols) = (data.rows(), data.cols());
    let x = AxisWindow::new(0.0, (cols - 1) as f64, 0.0, (cols - 1) as f64 * pixels_per_sample);
    let y = AxisWindow::new(0.0, (rows - 1) as f64, 0.0, (rows - 1) as f64 * pixels_per_sample);
    match WindowedSource::new(name, Arc::new(data), x, y, chunk_size) {
        Ok(source) => source,
        Err(e) => panic!("fixture source for {} is invalid: {}", name, e),
    }
}
