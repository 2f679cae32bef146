//! Tiling a visible window of an in-memory matrix into chunks.
//!
//! Chunks overlap by one sample so contours continue across chunk seams.
//! For a chunk starting at sample column `c0`, the visible part begins at
//! `vx0 = max(c0, view.start)`; its pixel bounds start at `pixel(vx0)` and
//! its data offset is `vx0 - c0`, which is only fractional for the first
//! chunk of a view that starts between samples.

use std::sync::Arc;

use crate::buffer_pool::Matrix;
use crate::chunk::{ChunkGeometry, ChunkSource, DataOffset, PixelBounds};
use crate::error::{ChunkError, ContourError, Result};

/// Largest chunk edge accepted, in samples.
pub const MAX_CHUNK_SIZE: usize = 2048;

/// Visible range along one axis, in fractional sample coordinates, and the
/// pixel span it maps onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisWindow {
    pub start: f64,
    pub end: f64,
    pub pixel_start: f64,
    pub pixel_end: f64,
}

impl AxisWindow {
    pub fn new(start: f64, end: f64, pixel_start: f64, pixel_end: f64) -> Self {
        Self {
            start,
            end,
            pixel_start,
            pixel_end,
        }
    }

    /// Pixels per sample. Negative when the pixel axis runs backwards.
    pub fn scale(&self) -> f64 {
        (self.pixel_end - self.pixel_start) / (self.end - self.start)
    }

    pub fn to_pixel(&self, sample: f64) -> f64 {
        self.pixel_start + (sample - self.start) * self.scale()
    }

    /// Inclusive sample index range touched by the window, clipped to `len`.
    fn sample_range(&self, len: usize) -> Option<(usize, usize)> {
        if len < 2 || !(self.end > self.start) {
            return None;
        }
        let first = self.start.floor().max(0.0) as usize;
        let last = (self.end.ceil() as usize).min(len - 1);
        (last > first).then_some((first, last))
    }
}

#[derive(Debug, Clone, Copy)]
struct Tiling {
    first: usize,
    last: usize,
    tiles: usize,
}

impl Tiling {
    fn new(first: usize, last: usize, step: usize) -> Self {
        let span = last - first;
        Self {
            first,
            last,
            tiles: span.div_ceil(step).max(1),
        }
    }

    /// Inclusive sample range of tile `t`.
    fn range(&self, t: usize, step: usize) -> (usize, usize) {
        let lo = self.first + t * step;
        (lo, (lo + step).min(self.last))
    }
}

/// [`ChunkSource`] over a full-resolution matrix held in memory.
#[derive(Debug, Clone)]
pub struct WindowedSource {
    name: String,
    data: Arc<Matrix>,
    x: AxisWindow,
    y: AxisWindow,
    step: usize,
    cols: Tiling,
    rows: Tiling,
}

impl WindowedSource {
    /// Tile the visible `x` (columns) and `y` (rows) window of `data` into
    /// chunks of at most `chunk_size` samples per edge.
    pub fn new(
        name: impl Into<String>,
        data: Arc<Matrix>,
        x: AxisWindow,
        y: AxisWindow,
        chunk_size: usize,
    ) -> Result<Self> {
        if !(2..=MAX_CHUNK_SIZE).contains(&chunk_size) {
            return Err(ContourError::InvalidDimensions(format!(
                "chunk size {} outside 2..={}",
                chunk_size, MAX_CHUNK_SIZE
            )));
        }
        let (c0, c1) = x.sample_range(data.cols()).ok_or_else(|| {
            ContourError::InvalidDimensions(format!(
                "column window {:?} does not cover {} columns",
                (x.start, x.end),
                data.cols()
            ))
        })?;
        let (r0, r1) = y.sample_range(data.rows()).ok_or_else(|| {
            ContourError::InvalidDimensions(format!(
                "row window {:?} does not cover {} rows",
                (y.start, y.end),
                data.rows()
            ))
        })?;
        let step = chunk_size - 1;
        Ok(Self {
            name: name.into(),
            data,
            x,
            y,
            step,
            cols: Tiling::new(c0, c1, step),
            rows: Tiling::new(r0, r1, step),
        })
    }

    /// Total number of chunks this source yields.
    pub fn chunk_count(&self) -> usize {
        self.cols.tiles * self.rows.tiles
    }
}

impl ChunkSource for WindowedSource {
    fn read_chunk(
        &mut self,
        index: usize,
        buffer: &mut Matrix,
    ) -> std::result::Result<Option<ChunkGeometry>, ChunkError> {
        if index >= self.chunk_count() {
            return Ok(None);
        }
        let (tx, ty) = (index % self.cols.tiles, index / self.cols.tiles);
        let (c0, c1) = self.cols.range(tx, self.step);
        let (r0, r1) = self.rows.range(ty, self.step);

        buffer.reshape(r1 - r0 + 1, c1 - c0 + 1);
        for (i, r) in (r0..=r1).enumerate() {
            buffer
                .row_mut(i)
                .copy_from_slice(&self.data.row(r)[c0..=c1]);
        }

        let vx0 = (c0 as f64).max(self.x.start);
        let vx1 = (c1 as f64).min(self.x.end);
        let vy0 = (r0 as f64).max(self.y.start);
        let vy1 = (r1 as f64).min(self.y.end);

        Ok(Some(ChunkGeometry {
            pixel_bounds: PixelBounds::new(
                self.x.to_pixel(vx0),
                self.y.to_pixel(vy0),
                self.x.to_pixel(vx1),
                self.y.to_pixel(vy1),
            ),
            data_offset: DataOffset::new(vx0 - c0 as f64, vy0 - r0 as f64),
            scale: (self.x.scale(), self.y.scale()),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::CellTransform;

    fn ramp(rows: usize, cols: usize) -> Arc<Matrix> {
        Arc::new(Matrix::from_fn(rows, cols, |r, c| (r * 1000 + c) as f32))
    }

    #[test]
    fn test_tiles_overlap_by_one_sample() {
        let data = ramp(10, 10);
        let mut src = WindowedSource::new(
            "ramp",
            data,
            AxisWindow::new(0.0, 9.0, 0.0, 90.0),
            AxisWindow::new(0.0, 9.0, 0.0, 90.0),
            4,
        )
        .unwrap();
        assert_eq!(src.chunk_count(), 9);

        let mut buf = Matrix::default();
        src.read_chunk(0, &mut buf).unwrap().unwrap();
        assert_eq!((buf.rows(), buf.cols()), (4, 4));
        assert_eq!(buf.get(0, 3), Some(3.0));

        src.read_chunk(1, &mut buf).unwrap().unwrap();
        // Second tile starts on the last column of the first
        assert_eq!(buf.get(0, 0), Some(3.0));

        let g = src.read_chunk(8, &mut buf).unwrap().unwrap();
        assert_eq!(buf.get(0, 0), Some(6006.0));
        assert_eq!(g.pixel_bounds, PixelBounds::new(60.0, 60.0, 90.0, 90.0));

        assert!(src.read_chunk(9, &mut buf).unwrap().is_none());
    }

    #[test]
    fn test_fractional_view_offset() {
        let data = ramp(8, 8);
        let mut src = WindowedSource::new(
            "ramp",
            data,
            AxisWindow::new(1.5, 6.0, 0.0, 45.0),
            AxisWindow::new(0.0, 7.0, 70.0, 0.0),
            16,
        )
        .unwrap();
        assert_eq!(src.chunk_count(), 1);
        let mut buf = Matrix::default();
        let g = src.read_chunk(0, &mut buf).unwrap().unwrap();
        // Columns 1..=6 are copied, view starts half a sample in
        assert_eq!(buf.cols(), 6);
        assert_eq!(g.data_offset, DataOffset::new(0.5, 0.0));
        assert_eq!(g.scale, (10.0, -10.0));

        let t = CellTransform::from(g);
        // Sample column 3 (local 2) sits 1.5 samples past the view start
        let (px, py) = t.to_pixel(2.0, 0.0);
        assert!((px - 15.0).abs() < 1e-9);
        assert!((py - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_windows() {
        let data = ramp(4, 4);
        let w = AxisWindow::new(0.0, 3.0, 0.0, 30.0);
        assert!(WindowedSource::new("x", data.clone(), w, w, 1).is_err());
        assert!(WindowedSource::new("x", data.clone(), w, w, 4096).is_err());
        let empty = AxisWindow::new(2.0, 2.0, 0.0, 30.0);
        assert!(WindowedSource::new("x", data.clone(), empty, w, 16).is_err());
        let outside = AxisWindow::new(10.0, 20.0, 0.0, 30.0);
        assert!(WindowedSource::new("x", data, outside, w, 16).is_err());
    }
}
