//! Links cell crossings into connected strokes.
//!
//! A walk starts at an unvisited, non-saddle cell, emits the crossing on its
//! entry edge and then follows exit edges from cell to cell. It ends when:
//!
//! - it comes back to the starting segment (closed ring, `close_path`),
//! - it leaves the chunk (open line),
//! - the next segment was already drawn by an earlier walk.
//!
//! Saddle segments are picked by the edge the walk came through. Saddles
//! that no walk reached are swept in a second pass.

use crate::cell::Edge;
use crate::contour::{CellGrid, CellTransform};
use crate::error::SurfaceError;
use crate::surface::RenderingSurface;

/// Summary of one walk over a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Strokes issued.
    pub paths: usize,
    /// Strokes that closed on themselves.
    pub closed: usize,
    /// Cell segments traversed.
    pub segments: usize,
}

impl std::ops::AddAssign for WalkStats {
    fn add_assign(&mut self, rhs: Self) {
        self.paths += rhs.paths;
        self.closed += rhs.closed;
        self.segments += rhs.segments;
    }
}

/// Walk every crossing in `cells` onto `surface`.
///
/// Visited flags are left set on return; call
/// [`CellGrid::clear_visited`] to walk the same grid again.
pub fn walk(
    cells: &mut CellGrid,
    transform: &CellTransform,
    surface: &mut dyn RenderingSurface,
) -> Result<WalkStats, SurfaceError> {
    let mut stats = WalkStats::default();

    for r in 0..cells.cell_rows() {
        for c in 0..cells.cell_cols() {
            let case = cells.case(r, c);
            if case.is_trivial() || case.is_saddle() || cells.is_visited(r, c, 0) {
                continue;
            }
            if let Some((entry, _)) = case.segments()[0] {
                stats += trace(cells, transform, surface, r, c, entry)?;
            }
        }
    }

    // Saddle segments not reached from any ordinary cell.
    for r in 0..cells.cell_rows() {
        for c in 0..cells.cell_cols() {
            let case = cells.case(r, c);
            if !case.is_saddle() {
                continue;
            }
            for (slot, seg) in case.segments().into_iter().enumerate() {
                if let Some((entry, _)) = seg {
                    if !cells.is_visited(r, c, slot) {
                        stats += trace(cells, transform, surface, r, c, entry)?;
                    }
                }
            }
        }
    }

    Ok(stats)
}

/// Follow one connected line starting at `(row, col)` through `entry`.
fn trace(
    cells: &mut CellGrid,
    transform: &CellTransform,
    surface: &mut dyn RenderingSurface,
    row: usize,
    col: usize,
    entry: Edge,
) -> Result<WalkStats, SurfaceError> {
    let start = (row, col, entry);
    let (mut r, mut c, mut entry) = start;
    let mut stats = WalkStats {
        paths: 1,
        ..WalkStats::default()
    };

    let (x, y) = cells.crossing_point(r, c, entry);
    let (px, py) = transform.to_pixel(x, y);
    surface.begin_path();
    surface.move_to(px, py);

    // Each segment is visited at most once, so this bounds the loop.
    let limit = 2 * cells.cell_rows() * cells.cell_cols();
    for _ in 0..limit {
        let Some((exit, slot)) = cells.case(r, c).exit_for(entry) else {
            break;
        };
        cells.mark_visited(r, c, slot);
        stats.segments += 1;

        let (x, y) = cells.crossing_point(r, c, exit);
        let (px, py) = transform.to_pixel(x, y);
        surface.line_to(px, py);

        let (dr, dc) = exit.step();
        let (nr, nc) = (r as isize + dr, c as isize + dc);
        if !cells.is_cell(nr, nc) {
            break;
        }
        let (nr, nc) = (nr as usize, nc as usize);
        let next_entry = exit.opposite();

        if (nr, nc, next_entry) == start {
            surface.close_path();
            stats.closed = 1;
            break;
        }
        match cells.case(nr, nc).exit_for(next_entry) {
            Some((_, next_slot)) if !cells.is_visited(nr, nc, next_slot) => {}
            _ => break,
        }
        r = nr;
        c = nc;
        entry = next_entry;
    }

    surface.stroke()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_pool::Matrix;
    use crate::chunk::{DataOffset, PixelBounds};
    use crate::contour::extract_cells;

    /// Minimal surface counting calls.
    #[derive(Default)]
    struct Tally {
        moves: usize,
        lines: usize,
        closes: usize,
        strokes: usize,
        points: Vec<(f64, f64)>,
    }

    impl RenderingSurface for Tally {
        fn set_line_width(&mut self, _width: f64) {}
        fn set_stroke_color(&mut self, _color: [u8; 4]) {}
        fn begin_path(&mut self) {}
        fn move_to(&mut self, x: f64, y: f64) {
            self.moves += 1;
            self.points.push((x, y));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.lines += 1;
            self.points.push((x, y));
        }
        fn close_path(&mut self) {
            self.closes += 1;
        }
        fn stroke(&mut self) -> Result<(), SurfaceError> {
            self.strokes += 1;
            Ok(())
        }
    }

    fn identity(rows: usize, cols: usize) -> CellTransform {
        CellTransform {
            bounds: PixelBounds::new(0.0, 0.0, (cols - 1) as f64, (rows - 1) as f64),
            offset: DataOffset::default(),
            scale: (1.0, 1.0),
        }
    }

    fn walk_matrix(z: &Matrix, level: f64) -> (WalkStats, Tally, CellGrid) {
        let mut cells = CellGrid::new();
        extract_cells(level, z, &mut cells);
        let mut tally = Tally::default();
        let stats = walk(&mut cells, &identity(z.rows(), z.cols()), &mut tally).unwrap();
        (stats, tally, cells)
    }

    #[test]
    fn test_ring_around_plateau() {
        let z = Matrix::from_fn(4, 4, |r, c| {
            if (1..3).contains(&r) && (1..3).contains(&c) {
                10.0
            } else {
                0.0
            }
        });
        let (stats, tally, _) = walk_matrix(&z, 5.0);
        assert_eq!(stats.paths, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.segments, 8);
        assert_eq!(tally.closes, 1);
        assert_eq!(tally.strokes, 1);
        assert_eq!(tally.lines, 8);
    }

    #[test]
    fn test_open_line_across_chunk() {
        // Ramp left to right: one vertical line crossing the whole chunk
        let z = Matrix::from_fn(5, 4, |_, c| c as f32);
        let (stats, tally, _) = walk_matrix(&z, 1.5);
        assert_eq!(stats.paths, 1);
        assert_eq!(stats.closed, 0);
        assert_eq!(stats.segments, 4);
        assert_eq!(tally.closes, 0);
        for &(x, _) in &tally.points {
            assert!((x - 1.5).abs() < 0.01);
        }
    }

    #[test]
    fn test_walk_starting_mid_line_joins_later() {
        // Diagonal ramp: row-major scan starts in the middle of the line
        let z = Matrix::from_fn(6, 6, |r, c| (r as f32 - c as f32).abs());
        let (stats, _, cells) = walk_matrix(&z, 2.5);
        let crossing_segments: usize = (0..cells.cell_rows())
            .flat_map(|r| (0..cells.cell_cols()).map(move |c| (r, c)))
            .map(|(r, c)| cells.case(r, c).segments().iter().flatten().count())
            .sum();
        // Every segment drawn exactly once
        assert_eq!(stats.segments, crossing_segments);
    }

    #[test]
    fn test_every_segment_marked_visited() {
        let z = Matrix::from_fn(9, 9, |r, c| {
            let x = c as f32 - 4.0;
            let y = r as f32 - 4.0;
            (x * 0.9).sin() * (y * 0.7).cos() * 10.0
        });
        let (stats, _, cells) = walk_matrix(&z, 1.0);
        let mut expected = 0;
        for r in 0..cells.cell_rows() {
            for c in 0..cells.cell_cols() {
                for (slot, seg) in cells.case(r, c).segments().iter().enumerate() {
                    if seg.is_some() {
                        expected += 1;
                        assert!(cells.is_visited(r, c, slot), "cell {r},{c} slot {slot}");
                    }
                }
            }
        }
        assert_eq!(stats.segments, expected);
        assert!(stats.segments <= 2 * cells.cell_rows() * cells.cell_cols());
    }

    #[test]
    fn test_saddle_only_grid() {
        // Checkerboard: every cell is a saddle
        let z = Matrix::from_fn(3, 3, |r, c| if (r + c) % 2 == 0 { 10.0 } else { 0.0 });
        let (stats, tally, _) = walk_matrix(&z, 5.0);
        assert_eq!(stats.segments, 8);
        assert_eq!(tally.strokes, stats.paths);
    }

    #[test]
    fn test_points_clamped_to_bounds() {
        let z = Matrix::from_fn(4, 4, |_, c| c as f32);
        let mut cells = CellGrid::new();
        extract_cells(0.5, &z, &mut cells);
        let transform = CellTransform {
            bounds: PixelBounds::new(10.0, 0.0, 20.0, 30.0),
            offset: DataOffset::default(),
            scale: (10.0, 10.0),
        };
        let mut tally = Tally::default();
        walk(&mut cells, &transform, &mut tally).unwrap();
        for &(x, y) in &tally.points {
            assert!((10.0..=20.0).contains(&x));
            assert!((0.0..=30.0).contains(&y));
        }
    }

    #[test]
    fn test_second_walk_after_clear() {
        let z = Matrix::from_fn(4, 4, |_, c| c as f32);
        let mut cells = CellGrid::new();
        extract_cells(1.5, &z, &mut cells);
        let t = identity(4, 4);
        let mut tally = Tally::default();
        let first = walk(&mut cells, &t, &mut tally).unwrap();
        let again = walk(&mut cells, &t, &mut tally).unwrap();
        assert_eq!(again, WalkStats::default());
        cells.clear_visited();
        assert_eq!(walk(&mut cells, &t, &mut tally).unwrap(), first);
    }
}
