//! Marching-squares cell classification.
//!
//! Corner bits follow the clockwise order top-left (1), top-right (2),
//! bottom-right (4), bottom-left (8); a bit is set when the corner lies
//! strictly above the level.
//!
//! Crossings are *directed*: walking clockwise around the cell boundary, an
//! edge that goes from a below corner to an above corner is an entry, the
//! reverse is an exit. Neighbouring cells traverse a shared edge in opposite
//! directions, so an exit of one cell is always the entry of the next one.

/// Bit set in the status word when the center average is above the level.
pub const CENTER_ABOVE: u32 = 1 << 4;
/// Visited flag for a cell's first (or only) segment.
pub const VISITED: u32 = 1 << 5;
/// Visited flag for the second segment of a saddle cell.
pub const VISITED_SECOND: u32 = 1 << 6;

const MASK_BITS: u32 = 0x0f;
const TOP_SHIFT: u32 = 8;
const LEFT_SHIFT: u32 = 16;

/// One side of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    /// The same physical edge as seen from the neighbouring cell.
    pub fn opposite(self) -> Self {
        match self {
            Edge::Top => Edge::Bottom,
            Edge::Right => Edge::Left,
            Edge::Bottom => Edge::Top,
            Edge::Left => Edge::Right,
        }
    }

    /// Row/column step to the neighbour across this edge.
    pub fn step(self) -> (isize, isize) {
        match self {
            Edge::Top => (-1, 0),
            Edge::Right => (0, 1),
            Edge::Bottom => (1, 0),
            Edge::Left => (0, -1),
        }
    }
}

/// Classification of one cell for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellCase {
    /// All corners at or below the level.
    Empty,
    /// All corners above the level.
    Full,
    /// A single crossing segment.
    Segment { entry: Edge, exit: Edge },
    /// Top-left and bottom-right above (mask 5).
    SaddleMain { center_above: bool },
    /// Top-right and bottom-left above (mask 10).
    SaddleAnti { center_above: bool },
}

/// Directed segment for every non-saddle mask. Entry first.
const SEGMENTS: [Option<(Edge, Edge)>; 16] = [
    None,                            // 0
    Some((Edge::Left, Edge::Top)),   // 1  tl
    Some((Edge::Top, Edge::Right)),  // 2  tr
    Some((Edge::Left, Edge::Right)), // 3  tl tr
    Some((Edge::Right, Edge::Bottom)), // 4  br
    None,                            // 5  saddle
    Some((Edge::Top, Edge::Bottom)), // 6  tr br
    Some((Edge::Left, Edge::Bottom)), // 7  tl tr br
    Some((Edge::Bottom, Edge::Left)), // 8  bl
    Some((Edge::Bottom, Edge::Top)), // 9  tl bl
    None,                            // 10 saddle
    Some((Edge::Bottom, Edge::Right)), // 11 tl tr bl
    Some((Edge::Right, Edge::Left)), // 12 br bl
    Some((Edge::Right, Edge::Top)),  // 13 tl br bl
    Some((Edge::Top, Edge::Left)),   // 14 tr br bl
    None,                            // 15
];

impl CellCase {
    /// Classify a corner mask. `center_above` only matters for saddles.
    pub fn classify(mask: u32, center_above: bool) -> Self {
        match mask & MASK_BITS {
            0 => CellCase::Empty,
            15 => CellCase::Full,
            5 => CellCase::SaddleMain { center_above },
            10 => CellCase::SaddleAnti { center_above },
            m => match SEGMENTS[m as usize] {
                Some((entry, exit)) => CellCase::Segment { entry, exit },
                None => CellCase::Empty,
            },
        }
    }

    /// Classify a packed status word.
    pub fn from_status(status: u32) -> Self {
        Self::classify(status, status & CENTER_ABOVE != 0)
    }

    pub fn is_trivial(self) -> bool {
        matches!(self, CellCase::Empty | CellCase::Full)
    }

    pub fn is_saddle(self) -> bool {
        matches!(self, CellCase::SaddleMain { .. } | CellCase::SaddleAnti { .. })
    }

    /// Directed segments of this cell, entry first. Saddles yield two.
    pub fn segments(self) -> [Option<(Edge, Edge)>; 2] {
        match self {
            CellCase::Empty | CellCase::Full => [None, None],
            CellCase::Segment { entry, exit } => [Some((entry, exit)), None],
            // Center above joins the two above corners through the middle.
            CellCase::SaddleMain { center_above: true } => [
                Some((Edge::Right, Edge::Top)),
                Some((Edge::Left, Edge::Bottom)),
            ],
            CellCase::SaddleMain { center_above: false } => [
                Some((Edge::Right, Edge::Bottom)),
                Some((Edge::Left, Edge::Top)),
            ],
            CellCase::SaddleAnti { center_above: true } => [
                Some((Edge::Top, Edge::Left)),
                Some((Edge::Bottom, Edge::Right)),
            ],
            CellCase::SaddleAnti { center_above: false } => [
                Some((Edge::Top, Edge::Right)),
                Some((Edge::Bottom, Edge::Left)),
            ],
        }
    }

    /// Exit edge and segment slot (0 or 1) for a walk entering through
    /// `entry`, or `None` when the cell has no segment starting there.
    pub fn exit_for(self, entry: Edge) -> Option<(Edge, usize)> {
        self.segments()
            .iter()
            .enumerate()
            .find_map(|(slot, seg)| match seg {
                Some((e, x)) if *e == entry => Some((*x, slot)),
                _ => None,
            })
    }
}

/// Pack a cell status word.
#[inline]
pub fn pack_status(mask: u32, center_above: bool, top: u8, left: u8) -> u32 {
    let mut status = mask & MASK_BITS;
    if center_above {
        status |= CENTER_ABOVE;
    }
    status | (u32::from(top) << TOP_SHIFT) | (u32::from(left) << LEFT_SHIFT)
}

#[inline]
pub fn corner_mask(status: u32) -> u32 {
    status & MASK_BITS
}

/// Crossing fraction along the top edge (left to right), 0..=1.
#[inline]
pub fn top_fraction(status: u32) -> f64 {
    f64::from((status >> TOP_SHIFT) & 0xff) / 255.0
}

/// Crossing fraction along the left edge (top to bottom), 0..=1.
#[inline]
pub fn left_fraction(status: u32) -> f64 {
    f64::from((status >> LEFT_SHIFT) & 0xff) / 255.0
}

#[inline]
pub fn visited_flag(slot: usize) -> u32 {
    if slot == 0 {
        VISITED
    } else {
        VISITED_SECOND
    }
}

/// Quantize an interpolation fraction to 8 bits.
#[inline]
pub fn quantize(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners_above(mask: u32) -> [bool; 4] {
        [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0]
    }

    /// Clockwise endpoints of an edge as corner indices (tl=0, tr=1, br=2, bl=3).
    fn edge_corners(edge: Edge) -> (usize, usize) {
        match edge {
            Edge::Top => (0, 1),
            Edge::Right => (1, 2),
            Edge::Bottom => (2, 3),
            Edge::Left => (3, 0),
        }
    }

    #[test]
    fn test_trivial_cases() {
        assert_eq!(CellCase::classify(0, false), CellCase::Empty);
        assert_eq!(CellCase::classify(15, true), CellCase::Full);
        assert!(CellCase::classify(0, false).segments().iter().all(Option::is_none));
    }

    #[test]
    fn test_every_segment_is_directed_below_to_above() {
        for mask in 0..16u32 {
            for center in [false, true] {
                let above = corners_above(mask);
                let case = CellCase::classify(mask, center);
                for (entry, exit) in case.segments().into_iter().flatten() {
                    let (a, b) = edge_corners(entry);
                    assert!(!above[a] && above[b], "mask {mask} entry {entry:?}");
                    let (a, b) = edge_corners(exit);
                    assert!(above[a] && !above[b], "mask {mask} exit {exit:?}");
                }
            }
        }
    }

    #[test]
    fn test_single_crossing_cases_have_one_segment() {
        for mask in [1, 2, 3, 4, 6, 7, 8, 9, 11, 12, 13, 14] {
            let case = CellCase::classify(mask, false);
            assert_eq!(case.segments().iter().flatten().count(), 1, "mask {mask}");
            assert!(!case.is_saddle());
        }
    }

    #[test]
    fn test_saddle_choice_depends_only_on_center() {
        let high = CellCase::classify(5, true).segments();
        let low = CellCase::classify(5, false).segments();
        assert_ne!(high, low);
        assert_eq!(high, CellCase::classify(5, true).segments());
        assert_eq!(CellCase::classify(10, true).exit_for(Edge::Top), Some((Edge::Left, 0)));
        assert_eq!(CellCase::classify(10, false).exit_for(Edge::Top), Some((Edge::Right, 0)));
        assert_eq!(CellCase::classify(10, false).exit_for(Edge::Bottom), Some((Edge::Left, 1)));
    }

    #[test]
    fn test_exit_for_unknown_entry() {
        let case = CellCase::classify(1, false);
        assert_eq!(case.exit_for(Edge::Left), Some((Edge::Top, 0)));
        assert_eq!(case.exit_for(Edge::Right), None);
    }

    #[test]
    fn test_status_packing() {
        let status = pack_status(5, true, 255, 128);
        assert_eq!(corner_mask(status), 5);
        assert!(status & CENTER_ABOVE != 0);
        assert!((top_fraction(status) - 1.0).abs() < 1e-9);
        assert!((left_fraction(status) - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(status & (VISITED | VISITED_SECOND), 0);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-3.0), 0);
    }
}
