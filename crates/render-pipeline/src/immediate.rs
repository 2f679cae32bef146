//! Synchronous rendering for snapshots and export.
//!
//! Extraction and drawing happen inline on the caller's thread. The only
//! way out early is the wall-clock budget, checked after every chunk.

use std::time::{Duration, Instant};

use contour_engine::{
    check_levels, extract_cells, extract_segments, walk, CellGrid, CellTransform, Chunk,
    ChunkIter, ContourStyle, RenderingSurface, SegmentBuffer, SurfaceError,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ImmediateMode;
use crate::error::Result;
use crate::layer::ContourLayer;

/// What an immediate render managed to draw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImmediateReport {
    /// `false` when the time budget ran out before every dataset finished.
    pub complete: bool,
    pub chunks: usize,
    pub strokes: usize,
    pub chunk_failures: usize,
    pub draw_failures: usize,
    /// Levels whose segment buffer filled up (segment mode only).
    pub overflows: usize,
}

/// Draw every layer onto `surface` within `budget`.
pub fn render_immediate(
    surface: &mut dyn RenderingSurface,
    layers: Vec<ContourLayer>,
    budget: Duration,
    mode: ImmediateMode,
) -> Result<ImmediateReport> {
    for layer in &layers {
        layer.style.validate()?;
    }

    let started = Instant::now();
    let mut report = ImmediateReport::default();
    let mut cells = CellGrid::new();
    let mut segments = SegmentBuffer::new();

    for layer in layers {
        let ContourLayer {
            name,
            style,
            source,
        } = layer;
        let mut chunks = ChunkIter::new(source);

        loop {
            let chunk = match chunks.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        dataset = %name,
                        error = %e,
                        "Chunk read failed, skipping rest of dataset"
                    );
                    report.chunk_failures += 1;
                    break;
                }
            };

            match mode {
                ImmediateMode::Walk => {
                    draw_walked(surface, &style, &chunk, &mut cells, &mut report)
                }
                ImmediateMode::Segments => {
                    draw_segments(surface, &style, &chunk, &mut segments, &mut report)
                }
            }
            report.chunks += 1;
            chunks.recycle(chunk);

            if started.elapsed() > budget {
                info!(
                    dataset = %name,
                    chunks = report.chunks,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Immediate render budget exhausted"
                );
                return Ok(report);
            }
        }
        debug!(dataset = %name, "Immediate render of dataset complete");
    }

    report.complete = true;
    Ok(report)
}

fn draw_walked(
    surface: &mut dyn RenderingSurface,
    style: &ContourStyle,
    chunk: &Chunk,
    cells: &mut CellGrid,
    report: &mut ImmediateReport,
) {
    let transform = CellTransform::from(chunk.geometry);
    for polarity in style.polarities() {
        let stroke = style.stroke(polarity);
        surface.set_line_width(stroke.width);
        surface.set_stroke_color(stroke.color);
        for magnitude in style.levels() {
            let level = polarity.signed(magnitude);
            if !check_levels(&chunk.matrix, level, polarity) {
                break;
            }
            if !extract_cells(level, &chunk.matrix, cells) {
                continue;
            }
            match walk(cells, &transform, surface) {
                Ok(stats) => report.strokes += stats.paths,
                Err(e) => {
                    warn!(chunk = chunk.index, level, error = %e, "Draw failed, continuing");
                    report.draw_failures += 1;
                }
            }
        }
    }
}

fn draw_segments(
    surface: &mut dyn RenderingSurface,
    style: &ContourStyle,
    chunk: &Chunk,
    segments: &mut SegmentBuffer,
    report: &mut ImmediateReport,
) {
    let transform = CellTransform::from(chunk.geometry);
    for polarity in style.polarities() {
        let stroke = style.stroke(polarity);
        surface.set_line_width(stroke.width);
        surface.set_stroke_color(stroke.color);
        for magnitude in style.levels() {
            let level = polarity.signed(magnitude);
            if !check_levels(&chunk.matrix, level, polarity) {
                break;
            }
            segments.clear();
            // An overflowing level contributes nothing this pass.
            if extract_segments(level, &chunk.matrix, segments) {
                debug!(chunk = chunk.index, level, "Segment buffer full, level skipped");
                report.overflows += 1;
                continue;
            }
            if segments.is_empty() {
                continue;
            }
            match stroke_segments(surface, segments, &transform) {
                Ok(()) => report.strokes += 1,
                Err(e) => {
                    warn!(chunk = chunk.index, level, error = %e, "Draw failed, continuing");
                    report.draw_failures += 1;
                }
            }
        }
    }
}

fn stroke_segments(
    surface: &mut dyn RenderingSurface,
    segments: &SegmentBuffer,
    transform: &CellTransform,
) -> std::result::Result<(), SurfaceError> {
    surface.begin_path();
    for ((x0, y0), (x1, y1)) in segments.segments() {
        let (px0, py0) = transform.to_pixel(x0, y0);
        let (px1, py1) = transform.to_pixel(x1, y1);
        surface.move_to(px0, py0);
        surface.line_to(px1, py1);
    }
    surface.stroke()
}
