//! Error types for the contour pipeline.

use contour_engine::ContourError;
use thiserror::Error;

/// Errors that can occur while setting up or running the pipeline.
///
/// Chunk read failures, draw failures, geometry overflow and cancellation
/// are recovered inside the stages and only show up in cycle reports.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid pipeline configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A worker thread, pool or task could not be started.
    #[error("failed to spawn {0}")]
    Spawn(String),

    /// The thread owning the rendering surface has stopped.
    #[error("rendering surface owner is no longer running")]
    SurfaceClosed,

    /// The drawer task panicked or was aborted.
    #[error("drawer task failed: {0}")]
    Join(String),

    /// Invalid layer style or geometry.
    #[error(transparent)]
    Contour(#[from] ContourError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
