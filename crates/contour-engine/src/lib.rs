//! Contour extraction for chunked two-dimensional spectra.
//!
//! The engine turns windows of a (possibly huge) intensity matrix into
//! contour strokes on a drawing surface:
//!
//! ```text
//! ChunkSource ──► ChunkIter (MatrixPool) ──► Chunk
//!                                            │
//!                      LevelSet ─────────────┤
//!                                            ▼
//!                            extract_cells / extract_segments
//!                                            │
//!                                            ▼
//!                          ContourGrid ──► walk ──► RenderingSurface
//! ```
//!
//! - Levels form a geometric progression (see [`levels`]).
//! - Cells are classified by marching squares with a center-average
//!   saddle rule (see [`cell`]).
//! - The walker links cell crossings into long `move_to`/`line_to` strokes.
//!
//! Concurrency lives in the `render-pipeline` crate; everything here is
//! single-threaded and allocation-conscious.

pub mod buffer_pool;
pub mod cell;
pub mod chunk;
pub mod contour;
pub mod error;
pub mod levels;
pub mod style;
pub mod surface;
pub mod walker;
pub mod window;

pub use buffer_pool::{Matrix, MatrixPool, PoolStats};
pub use cell::{CellCase, Edge};
pub use chunk::{Chunk, ChunkGeometry, ChunkIter, ChunkSource, DataOffset, PixelBounds};
pub use contour::{
    check_levels, extract_cells, extract_segments, CellGrid, CellTransform, ContourGrid,
    Polarity, SegmentBuffer,
};
pub use error::{ChunkError, ContourError, Result, SurfaceError};
pub use levels::levels;
pub use style::{ContourStyle, StrokeStyle, StyleConfig};
pub use surface::{PixmapSurface, RenderingSurface};
pub use walker::{walk, WalkStats};
pub use window::{AxisWindow, WindowedSource};
