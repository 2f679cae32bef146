//! Chunk sources with injected failures and latency.

use std::time::Duration;

use contour_engine::{ChunkError, ChunkGeometry, ChunkSource, Matrix};

/// Wraps a source and fails with an I/O-style error at chunk `fail_at`.
pub struct FailingSource<S> {
    inner: S,
    fail_at: usize,
}

impl<S: ChunkSource> FailingSource<S> {
    pub fn new(inner: S, fail_at: usize) -> Self {
        Self { inner, fail_at }
    }
}

impl<S: ChunkSource> ChunkSource for FailingSource<S> {
    fn read_chunk(
        &mut self,
        index: usize,
        buffer: &mut Matrix,
    ) -> Result<Option<ChunkGeometry>, ChunkError> {
        if index == self.fail_at {
            return Err(ChunkError::read_failed(index, "simulated read error"));
        }
        self.inner.read_chunk(index, buffer)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Wraps a source and sleeps before every chunk read.
pub struct SlowSource<S> {
    inner: S,
    delay: Duration,
}

impl<S: ChunkSource> SlowSource<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<S: ChunkSource> ChunkSource for SlowSource<S> {
    fn read_chunk(
        &mut self,
        index: usize,
        buffer: &mut Matrix,
    ) -> Result<Option<ChunkGeometry>, ChunkError> {
        std::thread::sleep(self.delay);
        self.inner.read_chunk(index, buffer)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
