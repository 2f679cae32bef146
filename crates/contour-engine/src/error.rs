//! Error types for contour extraction and drawing.

use thiserror::Error;

/// Failure while reading a chunk of samples from a dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkError {
    /// The backing store could not deliver the requested window.
    #[error("failed to read chunk {index}: {message}")]
    ReadFailed { index: usize, message: String },

    /// The source produced a window with unusable dimensions.
    #[error("chunk {index} has invalid dimensions {rows}x{cols}")]
    InvalidWindow { index: usize, rows: usize, cols: usize },
}

impl ChunkError {
    /// Create a ReadFailed error.
    pub fn read_failed(index: usize, msg: impl Into<String>) -> Self {
        Self::ReadFailed {
            index,
            message: msg.into(),
        }
    }
}

/// Failure reported by a rendering surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// Stroke was requested without any path geometry.
    #[error("stroke requested on an empty path")]
    EmptyPath,

    /// The backend rejected the draw call.
    #[error("surface backend error: {0}")]
    Backend(String),
}

/// Errors that can occur in the contour engine.
#[derive(Error, Debug)]
pub enum ContourError {
    /// Chunk acquisition failed.
    #[error(transparent)]
    ChunkRead(#[from] ChunkError),

    /// Drawing onto the surface failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Matrix or grid dimensions do not line up.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Contour style could not be loaded or is inconsistent.
    #[error("invalid contour style: {0}")]
    Style(String),
}

impl From<std::io::Error> for ContourError {
    fn from(err: std::io::Error) -> Self {
        Self::Style(err.to_string())
    }
}

impl From<serde_json::Error> for ContourError {
    fn from(err: serde_json::Error) -> Self {
        Self::Style(err.to_string())
    }
}

/// Result type for contour engine operations.
pub type Result<T> = std::result::Result<T, ContourError>;
