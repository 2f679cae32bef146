//! Per-chunk contour extraction (marching squares).
//!
//! Two output representations are produced from the same cell rules:
//!
//! - a [`CellGrid`] of packed status words, consumed by the path walker;
//! - a [`SegmentBuffer`] of fixed-point segment endpoints, used where each
//!   crossing is drawn as an independent line.
//!
//! Samples that are missing (NaN) or outside the chunk read as
//! [`EDGE_VALUE`], so boundary cells never report the outside as above a
//! level.

use crate::buffer_pool::Matrix;
use crate::cell::{self, CellCase, Edge};
use crate::chunk::{ChunkGeometry, DataOffset, PixelBounds};

/// Value substituted for samples past the last row/column.
pub const EDGE_VALUE: f64 = f64::NEG_INFINITY;

/// Maximum number of i16 coordinates a segment buffer holds.
pub const SEGMENT_CAPACITY: usize = 65536;

/// Fixed-point scale for segment coordinates (1/16 sample).
pub const FIXED_POINT_SCALE: f64 = 16.0;

/// Sign of the levels being traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }

    /// Apply the polarity to an unsigned level magnitude.
    pub fn signed(self, level: f64) -> f64 {
        self.sign() * level
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Packed cell statuses for one chunk and one level.
///
/// Storage is sample-shaped (`rows x cols`): the real cells are the
/// `(rows-1) x (cols-1)` interior ones, while the extra last row and column
/// only carry the crossing fractions their neighbours need for their right
/// and bottom edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u32>,
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize for a chunk of `rows x cols` samples, clearing all statuses.
    pub fn reset(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.cells.clear();
        self.cells.resize(rows * cols, 0);
    }

    /// Number of real cell rows.
    pub fn cell_rows(&self) -> usize {
        self.rows.saturating_sub(1)
    }

    /// Number of real cell columns.
    pub fn cell_cols(&self) -> usize {
        self.cols.saturating_sub(1)
    }

    /// Whether `(row, col)` addresses a real cell.
    #[inline]
    pub fn is_cell(&self, row: isize, col: isize) -> bool {
        row >= 0
            && col >= 0
            && (row as usize) < self.cell_rows()
            && (col as usize) < self.cell_cols()
    }

    #[inline]
    pub fn status(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub fn case(&self, row: usize, col: usize) -> CellCase {
        CellCase::from_status(self.status(row, col))
    }

    #[inline]
    pub(crate) fn set_status(&mut self, row: usize, col: usize, status: u32) {
        self.cells[row * self.cols + col] = status;
    }

    #[inline]
    pub fn is_visited(&self, row: usize, col: usize, slot: usize) -> bool {
        self.status(row, col) & cell::visited_flag(slot) != 0
    }

    #[inline]
    pub fn mark_visited(&mut self, row: usize, col: usize, slot: usize) {
        let idx = row * self.cols + col;
        self.cells[idx] |= cell::visited_flag(slot);
    }

    /// Clear all visited flags so the grid can be walked again.
    pub fn clear_visited(&mut self) {
        for status in &mut self.cells {
            *status &= !(cell::VISITED | cell::VISITED_SECOND);
        }
    }

    /// Number of real cells with at least one crossing.
    pub fn crossing_cells(&self) -> usize {
        let mut count = 0;
        for r in 0..self.cell_rows() {
            for c in 0..self.cell_cols() {
                if !self.case(r, c).is_trivial() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Crossing point on `edge` of cell `(row, col)` in chunk-local sample
    /// coordinates `(x = column, y = row)`.
    pub fn crossing_point(&self, row: usize, col: usize, edge: Edge) -> (f64, f64) {
        let (r, c) = (row as f64, col as f64);
        match edge {
            Edge::Top => (c + cell::top_fraction(self.status(row, col)), r),
            Edge::Bottom => (c + cell::top_fraction(self.status(row + 1, col)), r + 1.0),
            Edge::Left => (c, r + cell::left_fraction(self.status(row, col))),
            Edge::Right => (c + 1.0, r + cell::left_fraction(self.status(row, col + 1))),
        }
    }
}

/// Maps chunk-local sample coordinates onto the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellTransform {
    pub bounds: PixelBounds,
    pub offset: DataOffset,
    pub scale: (f64, f64),
}

impl CellTransform {
    /// Pixel position of a chunk-local point, clamped to the chunk bounds.
    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = self.bounds.x0 + (x - self.offset.x) * self.scale.0;
        let py = self.bounds.y0 + (y - self.offset.y) * self.scale.1;
        self.bounds.clamp(px, py)
    }
}

impl From<ChunkGeometry> for CellTransform {
    fn from(geometry: ChunkGeometry) -> Self {
        Self {
            bounds: geometry.pixel_bounds,
            offset: geometry.data_offset,
            scale: geometry.scale,
        }
    }
}

/// A finished cell grid plus everything needed to draw it.
#[derive(Debug, Clone)]
pub struct ContourGrid {
    pub level: f64,
    pub polarity: Polarity,
    pub chunk_index: usize,
    pub cells: CellGrid,
    pub transform: CellTransform,
}

#[inline]
fn sample(z: &Matrix, row: usize, col: usize) -> f64 {
    match z.get(row, col) {
        Some(v) if !v.is_nan() => f64::from(v),
        _ => EDGE_VALUE,
    }
}

/// Position of `level` between `near` (0) and `far` (1).
#[inline]
fn crossing_fraction(near: f64, far: f64, level: f64) -> f64 {
    let delta = far - near;
    if !delta.is_finite() {
        return if near.is_finite() { 0.0 } else { 1.0 };
    }
    if delta.abs() < f64::EPSILON {
        return 0.5;
    }
    ((level - near) / delta).clamp(0.0, 1.0)
}

/// Corner samples of a cell: top-left, top-right, bottom-right, bottom-left.
#[inline]
fn corners(z: &Matrix, row: usize, col: usize) -> [f64; 4] {
    [
        sample(z, row, col),
        sample(z, row, col + 1),
        sample(z, row + 1, col + 1),
        sample(z, row + 1, col),
    ]
}

#[inline]
fn corner_mask(corners: &[f64; 4], level: f64) -> u32 {
    let mut mask = 0;
    for (bit, &v) in corners.iter().enumerate() {
        if v > level {
            mask |= 1 << bit;
        }
    }
    mask
}

/// Center-average saddle rule.
#[inline]
fn center_above(corners: &[f64; 4], level: f64) -> bool {
    (corners[0] + corners[1] + corners[2] + corners[3]) / 4.0 > level
}

/// Classify every cell of `z` against `level`, writing packed statuses into
/// `out`. Returns `true` when at least one real cell has a crossing.
pub fn extract_cells(level: f64, z: &Matrix, out: &mut CellGrid) -> bool {
    let (rows, cols) = (z.rows(), z.cols());
    out.reset(rows, cols);
    let mut any = false;

    for r in 0..rows {
        for c in 0..cols {
            let k = corners(z, r, c);
            let mask = corner_mask(&k, level);
            let top = if (k[0] > level) != (k[1] > level) {
                cell::quantize(crossing_fraction(k[0], k[1], level))
            } else {
                0
            };
            let left = if (k[0] > level) != (k[3] > level) {
                cell::quantize(crossing_fraction(k[0], k[3], level))
            } else {
                0
            };
            let saddle = mask == 5 || mask == 10;
            let center = saddle && center_above(&k, level);
            out.set_status(r, c, cell::pack_status(mask, center, top, left));

            if r + 1 < rows && c + 1 < cols && mask != 0 && mask != 15 {
                any = true;
            }
        }
    }
    any
}

/// Whether any sample lies beyond `level` in the direction of `polarity`.
///
/// If none does, no level further out in the same polarity can produce a
/// crossing either.
pub fn check_levels(z: &Matrix, level: f64, polarity: Polarity) -> bool {
    let mut values = z.as_slice().iter().filter(|v| !v.is_nan()).map(|&v| f64::from(v));
    match polarity {
        Polarity::Positive => values.any(|v| v > level),
        Polarity::Negative => values.any(|v| v < level),
    }
}

/// Fixed-capacity buffer of `(x0, y0, x1, y1)` segment quadruples in
/// 1/[`FIXED_POINT_SCALE`] sample units.
#[derive(Debug, Clone)]
pub struct SegmentBuffer {
    coords: Vec<i16>,
    capacity: usize,
}

impl Default for SegmentBuffer {
    fn default() -> Self {
        Self::with_capacity(SEGMENT_CAPACITY)
    }
}

impl SegmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding at most `capacity` coordinates (rounded down to whole
    /// segments).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            coords: Vec::with_capacity(capacity.min(SEGMENT_CAPACITY)),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.coords.clear();
    }

    pub fn len(&self) -> usize {
        self.coords.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn raw(&self) -> &[i16] {
        &self.coords
    }

    /// Append a segment. Returns `false` without writing when full.
    fn push(&mut self, p0: (f64, f64), p1: (f64, f64)) -> bool {
        if self.coords.len() + 4 > self.capacity {
            return false;
        }
        self.coords
            .extend_from_slice(&[to_fixed(p0.0), to_fixed(p0.1), to_fixed(p1.0), to_fixed(p1.1)]);
        true
    }

    /// Decoded segments in chunk-local sample coordinates.
    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.coords.chunks_exact(4).map(|q| {
            (
                (from_fixed(q[0]), from_fixed(q[1])),
                (from_fixed(q[2]), from_fixed(q[3])),
            )
        })
    }
}

#[inline]
fn to_fixed(v: f64) -> i16 {
    (v * FIXED_POINT_SCALE)
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

#[inline]
fn from_fixed(v: i16) -> f64 {
    f64::from(v) / FIXED_POINT_SCALE
}

/// Crossing on `edge` of cell `(row, col)` computed straight from corners.
fn edge_point(row: usize, col: usize, k: &[f64; 4], edge: Edge, level: f64) -> (f64, f64) {
    let (r, c) = (row as f64, col as f64);
    match edge {
        Edge::Top => (c + crossing_fraction(k[0], k[1], level), r),
        Edge::Right => (c + 1.0, r + crossing_fraction(k[1], k[2], level)),
        Edge::Bottom => (c + crossing_fraction(k[3], k[2], level), r + 1.0),
        Edge::Left => (c, r + crossing_fraction(k[0], k[3], level)),
    }
}

/// Append one segment per crossing (two for saddles) for every real cell of
/// `z` to `out`.
///
/// Returns `true` if the buffer filled up before the pass finished; the
/// segments written so far stay valid.
pub fn extract_segments(level: f64, z: &Matrix, out: &mut SegmentBuffer) -> bool {
    let (rows, cols) = (z.rows(), z.cols());
    if rows < 2 || cols < 2 {
        return false;
    }

    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let k = corners(z, r, c);
            let mask = corner_mask(&k, level);
            if mask == 0 || mask == 15 {
                continue;
            }
            let center = (mask == 5 || mask == 10) && center_above(&k, level);
            for (entry, exit) in CellCase::classify(mask, center).segments().into_iter().flatten() {
                let p0 = edge_point(r, c, &k, entry, level);
                let p1 = edge_point(r, c, &k, exit, level);
                if !out.push(p0, p1) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize, values: &[f32]) -> Matrix {
        Matrix::from_vec(rows, cols, values.to_vec()).unwrap()
    }

    #[test]
    fn test_flat_field_has_no_crossings() {
        let z = grid(3, 3, &[5.0; 9]);
        let mut cells = CellGrid::new();
        assert!(!extract_cells(5.0, &z, &mut cells));
        assert_eq!(cells.crossing_cells(), 0);

        let mut segs = SegmentBuffer::new();
        assert!(!extract_segments(5.0, &z, &mut segs));
        assert!(segs.is_empty());
    }

    #[test]
    fn test_single_corner_cell() {
        // Only top-left above the level
        let z = grid(2, 2, &[10.0, 0.0, 0.0, 0.0]);
        let mut cells = CellGrid::new();
        assert!(extract_cells(5.0, &z, &mut cells));
        assert_eq!(
            cells.case(0, 0),
            CellCase::Segment {
                entry: Edge::Left,
                exit: Edge::Top
            }
        );
        let (x, y) = cells.crossing_point(0, 0, Edge::Top);
        assert!((x - 0.5).abs() < 0.01);
        assert_eq!(y, 0.0);
        let (x, y) = cells.crossing_point(0, 0, Edge::Left);
        assert_eq!(x, 0.0);
        assert!((y - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_interpolation_fraction() {
        // Level at 25% of the way from 0 to 8 on the top edge
        let z = grid(2, 2, &[0.0, 8.0, 8.0, 0.0]);
        let mut cells = CellGrid::new();
        extract_cells(2.0, &z, &mut cells);
        let (x, _) = cells.crossing_point(0, 0, Edge::Top);
        assert!((x - 0.25).abs() < 1.0 / 255.0);
    }

    #[test]
    fn test_boundary_storage_never_above() {
        let z = grid(2, 2, &[9.0; 4]);
        let mut cells = CellGrid::new();
        extract_cells(1.0, &z, &mut cells);
        assert_eq!(cells.case(0, 0), CellCase::Full);
        // Last-column storage sees the edge value on its right
        assert_eq!(cell::corner_mask(cells.status(0, 1)), 1 | 8);
        assert_eq!(cell::corner_mask(cells.status(1, 1)), 1);
    }

    #[test]
    fn test_nan_reads_as_edge_value() {
        let z = grid(2, 2, &[f32::NAN, 9.0, 9.0, 9.0]);
        let mut cells = CellGrid::new();
        assert!(extract_cells(1.0, &z, &mut cells));
        assert_eq!(cell::corner_mask(cells.status(0, 0)), 2 | 4 | 8);
    }

    #[test]
    fn test_saddle_center_average() {
        // tl and br high, center average decides the connection
        let z = grid(2, 2, &[10.0, 0.0, 0.0, 10.0]);
        let mut cells = CellGrid::new();
        extract_cells(4.0, &z, &mut cells);
        assert_eq!(cells.case(0, 0), CellCase::SaddleMain { center_above: true });
        extract_cells(6.0, &z, &mut cells);
        assert_eq!(cells.case(0, 0), CellCase::SaddleMain { center_above: false });
    }

    #[test]
    fn test_segments_saddle_emits_two() {
        let z = grid(2, 2, &[0.0, 10.0, 10.0, 0.0]);
        let mut segs = SegmentBuffer::new();
        extract_segments(5.0, &z, &mut segs);
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn test_single_crossing_endpoints_lie_on_cell_edges() {
        for mask in (1..15u32).filter(|m| *m != 5 && *m != 10) {
            let v = |bit: u32| if mask & bit != 0 { 10.0 } else { 0.0 };
            // Row-major samples: tl, tr, bl, br
            let z = grid(2, 2, &[v(1), v(2), v(8), v(4)]);
            let mut segs = SegmentBuffer::new();
            assert!(!extract_segments(5.0, &z, &mut segs));
            assert_eq!(segs.len(), 1, "mask {mask}");

            let ((x0, y0), (x1, y1)) = segs.segments().next().unwrap();
            for (x, y) in [(x0, y0), (x1, y1)] {
                assert!((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y));
                let on_vertical = x == 0.0 || x == 1.0;
                let on_horizontal = y == 0.0 || y == 1.0;
                assert!(on_vertical || on_horizontal, "mask {mask} point ({x}, {y})");
            }
            assert!((x0, y0) != (x1, y1), "mask {mask} degenerate segment");
        }
    }

    #[test]
    fn test_segment_overflow() {
        // Vertical ramp: every cell in the first column crosses
        let z = Matrix::from_fn(64, 2, |_, c| c as f32);
        let mut segs = SegmentBuffer::with_capacity(40);
        assert!(extract_segments(0.5, &z, &mut segs));
        assert_eq!(segs.len(), 10);

        let mut segs = SegmentBuffer::new();
        assert!(!extract_segments(0.5, &z, &mut segs));
        assert_eq!(segs.len(), 63);
    }

    #[test]
    fn test_fixed_point_roundtrip_precision() {
        let z = grid(2, 2, &[0.0, 3.0, 0.0, 3.0]);
        let mut segs = SegmentBuffer::new();
        extract_segments(1.0, &z, &mut segs);
        let ((x0, y0), (x1, y1)) = segs.segments().next().unwrap();
        assert!((x0 - 1.0 / 3.0).abs() <= 1.0 / FIXED_POINT_SCALE);
        assert_eq!(y0, 0.0);
        assert!((x1 - 1.0 / 3.0).abs() <= 1.0 / FIXED_POINT_SCALE);
        assert_eq!(y1, 1.0);
    }

    #[test]
    fn test_check_levels() {
        let z = grid(2, 2, &[1.0, -3.0, 2.0, f32::NAN]);
        assert!(check_levels(&z, 1.5, Polarity::Positive));
        assert!(!check_levels(&z, 2.0, Polarity::Positive));
        assert!(check_levels(&z, -2.0, Polarity::Negative));
        assert!(!check_levels(&z, -3.0, Polarity::Negative));
    }

    #[test]
    fn test_transform_clamps_to_bounds() {
        let t = CellTransform {
            bounds: PixelBounds::new(0.0, 0.0, 100.0, 50.0),
            offset: DataOffset::new(0.5, 0.0),
            scale: (10.0, 5.0),
        };
        assert_eq!(t.to_pixel(1.5, 2.0), (10.0, 10.0));
        assert_eq!(t.to_pixel(0.0, 0.0), (0.0, 0.0));
        assert_eq!(t.to_pixel(50.0, 50.0), (100.0, 50.0));
    }
}
