//! Reusable sample buffers for chunk windows.
//!
//! Reading a large spectrum means filling many chunk-sized windows in a row.
//! Instead of allocating a fresh `Vec<f32>` per chunk, a [`MatrixPool`] keeps
//! released buffers and hands them back out on the next [`MatrixPool::acquire`].
//!
//! ## Design
//!
//! - **Owned by the iterator**: each [`crate::ChunkIter`] owns one pool, so a
//!   buffer is never shared between datasets or threads.
//! - **Tiered sizing**: capacities are rounded up to common chunk sizes
//!   (256², 512², 1024², 2048²) to minimize regrowth.
//! - **Explicit hand-back**: a matrix is returned with [`MatrixPool::release`]
//!   after its extraction pass.

/// Standard chunk sizes for pre-allocated buffers
const CHUNK_256: usize = 256 * 256;
const CHUNK_512: usize = 512 * 512;
const CHUNK_1024: usize = 1024 * 1024;
const CHUNK_2048: usize = 2048 * 2048;

/// Maximum number of idle buffers kept by a pool.
const MAX_IDLE: usize = 4;

/// Row-major matrix of intensity samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Create a zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap existing row-major data. Returns `None` when the length does not
    /// match `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Build a matrix from a function of `(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(row, col)`, or `None` outside the matrix.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
        }
    }

    /// One row of samples.
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Change the shape in place, reusing the allocation. Contents are zeroed.
    pub fn reshape(&mut self, rows: usize, cols: usize) {
        let size = rows * cols;
        self.data.clear();
        if self.data.capacity() < size {
            self.data.reserve(optimal_capacity(size));
        }
        self.data.resize(size, 0.0);
        self.rows = rows;
        self.cols = cols;
    }

    fn capacity(&self) -> usize {
        self.data.capacity()
    }
}

/// Pool of sample buffers handed out per chunk.
#[derive(Debug, Default)]
pub struct MatrixPool {
    idle: Vec<Matrix>,
    allocations: usize,
    reuses: usize,
}

impl MatrixPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a zeroed matrix of the requested shape, reusing an idle buffer
    /// when one is available.
    pub fn acquire(&mut self, rows: usize, cols: usize) -> Matrix {
        let size = rows * cols;
        // Prefer the smallest idle buffer that already fits.
        let best = self
            .idle
            .iter()
            .enumerate()
            .filter(|(_, m)| m.capacity() >= size)
            .min_by_key(|(_, m)| m.capacity())
            .map(|(i, _)| i);

        let mut matrix = match best.or(if self.idle.is_empty() {
            None
        } else {
            Some(self.idle.len() - 1)
        }) {
            Some(i) => {
                self.reuses += 1;
                self.idle.swap_remove(i)
            }
            None => {
                self.allocations += 1;
                Matrix {
                    rows: 0,
                    cols: 0,
                    data: Vec::with_capacity(optimal_capacity(size)),
                }
            }
        };
        matrix.reshape(rows, cols);
        matrix
    }

    /// Return a matrix to the pool.
    pub fn release(&mut self, matrix: Matrix) {
        if self.idle.len() < MAX_IDLE {
            self.idle.push(matrix);
        }
    }

    /// Get current pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle_buffers: self.idle.len(),
            idle_capacity: self.idle.iter().map(|m| m.capacity()).sum(),
            allocations: self.allocations,
            reuses: self.reuses,
        }
    }
}

/// Statistics about buffer pool usage (for debugging/monitoring)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PoolStats {
    pub idle_buffers: usize,
    /// Total capacity of idle buffers, in samples.
    pub idle_capacity: usize,
    pub allocations: usize,
    pub reuses: usize,
}

/// Return an optimal pre-allocation capacity for the given size.
/// Rounds up to common chunk sizes to reduce future reallocations.
#[inline]
fn optimal_capacity(size: usize) -> usize {
    if size <= CHUNK_256 {
        CHUNK_256
    } else if size <= CHUNK_512 {
        CHUNK_512
    } else if size <= CHUNK_1024 {
        CHUNK_1024
    } else if size <= CHUNK_2048 {
        CHUNK_2048
    } else {
        size.next_power_of_two()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_access() {
        let m = Matrix::from_fn(3, 4, |r, c| (r * 10 + c) as f32);
        assert_eq!(m.get(0, 0), Some(0.0));
        assert_eq!(m.get(2, 3), Some(23.0));
        assert_eq!(m.get(3, 0), None);
        assert_eq!(m.row(1), &[10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Matrix::from_vec(2, 2, vec![0.0; 4]).is_some());
        assert!(Matrix::from_vec(2, 3, vec![0.0; 4]).is_none());
    }

    #[test]
    fn test_pool_reuse() {
        let mut pool = MatrixPool::new();
        let mut m = pool.acquire(64, 64);
        m.set(0, 0, 7.0);
        pool.release(m);

        let m = pool.acquire(32, 32);
        // Reused buffer is zeroed and reshaped
        assert_eq!(m.rows(), 32);
        assert_eq!(m.get(0, 0), Some(0.0));

        let stats = pool.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.reuses, 1);
    }

    #[test]
    fn test_pool_grows_reused_buffer() {
        let mut pool = MatrixPool::new();
        let m = pool.acquire(16, 16);
        pool.release(m);
        let m = pool.acquire(600, 600);
        assert_eq!(m.as_slice().len(), 600 * 600);
        assert_eq!(pool.stats().allocations, 1);
    }

    #[test]
    fn test_pool_caps_idle_buffers() {
        let mut pool = MatrixPool::new();
        for _ in 0..10 {
            pool.release(Matrix::new(2, 2));
        }
        assert_eq!(pool.stats().idle_buffers, MAX_IDLE);
    }

    #[test]
    fn test_optimal_capacity() {
        assert_eq!(optimal_capacity(100), CHUNK_256);
        assert_eq!(optimal_capacity(CHUNK_256), CHUNK_256);
        assert_eq!(optimal_capacity(CHUNK_256 + 1), CHUNK_512);
        assert_eq!(optimal_capacity(CHUNK_512 + 1), CHUNK_1024);
        assert_eq!(optimal_capacity(CHUNK_1024 + 1), CHUNK_2048);
    }
}
