//! Chunked acquisition of dataset windows.
//!
//! A dataset far larger than memory is consumed as a sequence of rectangular
//! windows. Each window comes with the pixel rectangle it covers on the
//! drawing surface and the sub-sample offset needed to place its samples.

use tracing::debug;

use crate::buffer_pool::{Matrix, MatrixPool, PoolStats};
use crate::error::ChunkError;

/// Two opposite corners of a chunk on the rendering surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBounds {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PixelBounds {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Clamp a point into the rectangle. Works for either corner ordering.
    #[inline]
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        let (xmin, xmax) = (self.x0.min(self.x1), self.x0.max(self.x1));
        let (ymin, ymax) = (self.y0.min(self.y1), self.y0.max(self.y1));
        (x.clamp(xmin, xmax), y.clamp(ymin, ymax))
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.clamp(x, y) == (x, y)
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }
}

/// Fractional sample position, in chunk-local sample units, that maps onto
/// the pixel bounds origin `(x0, y0)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DataOffset {
    pub x: f64,
    pub y: f64,
}

impl DataOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Placement of a chunk window on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkGeometry {
    pub pixel_bounds: PixelBounds,
    pub data_offset: DataOffset,
    /// Pixels per sample along columns and rows. Negative values flip an axis.
    pub scale: (f64, f64),
}

impl ChunkGeometry {
    /// Geometry for a chunk whose first sample sits at `(x0, y0)` with the
    /// given pixels-per-sample scale.
    pub fn from_origin(x0: f64, y0: f64, rows: usize, cols: usize, scale: (f64, f64)) -> Self {
        let x1 = x0 + cols.saturating_sub(1) as f64 * scale.0;
        let y1 = y0 + rows.saturating_sub(1) as f64 * scale.1;
        Self {
            pixel_bounds: PixelBounds::new(x0, y0, x1, y1),
            data_offset: DataOffset::default(),
            scale,
        }
    }
}

/// Supplier of chunk windows for one dataset.
///
/// Implementations fill `buffer` (reshaping it as needed) with the window
/// for `index` and return its geometry, or `Ok(None)` once the dataset is
/// exhausted. Indices are requested in increasing order starting at zero.
pub trait ChunkSource: Send {
    fn read_chunk(
        &mut self,
        index: usize,
        buffer: &mut Matrix,
    ) -> Result<Option<ChunkGeometry>, ChunkError>;

    /// Short name used in log output.
    fn name(&self) -> &str {
        "dataset"
    }
}

impl<T: ChunkSource + ?Sized> ChunkSource for Box<T> {
    fn read_chunk(
        &mut self,
        index: usize,
        buffer: &mut Matrix,
    ) -> Result<Option<ChunkGeometry>, ChunkError> {
        (**self).read_chunk(index, buffer)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// One window of samples with its placement.
#[derive(Debug)]
pub struct Chunk {
    pub index: usize,
    pub matrix: Matrix,
    pub geometry: ChunkGeometry,
}

/// Streams chunks from a source, recycling sample buffers between them.
pub struct ChunkIter<S> {
    source: S,
    pool: MatrixPool,
    next_index: usize,
    exhausted: bool,
}

impl<S: ChunkSource> ChunkIter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pool: MatrixPool::new(),
            next_index: 0,
            exhausted: false,
        }
    }

    /// Read the next chunk. Returns `Ok(None)` when the source reports
    /// exhaustion; after an error or exhaustion no further reads happen.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError> {
        if self.exhausted {
            return Ok(None);
        }
        let index = self.next_index;
        let mut matrix = self.pool.acquire(0, 0);
        match self.source.read_chunk(index, &mut matrix) {
            Ok(Some(geometry)) => {
                if matrix.rows() < 2 || matrix.cols() < 2 {
                    self.exhausted = true;
                    return Err(ChunkError::InvalidWindow {
                        index,
                        rows: matrix.rows(),
                        cols: matrix.cols(),
                    });
                }
                self.next_index += 1;
                Ok(Some(Chunk {
                    index,
                    matrix,
                    geometry,
                }))
            }
            Ok(None) => {
                debug!(source = self.source.name(), chunks = index, "Chunk source exhausted");
                self.exhausted = true;
                self.pool.release(matrix);
                Ok(None)
            }
            Err(e) => {
                self.exhausted = true;
                self.pool.release(matrix);
                Err(e)
            }
        }
    }

    /// Hand a chunk's buffer back for reuse.
    pub fn recycle(&mut self, chunk: Chunk) {
        self.pool.release(chunk.matrix);
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}
