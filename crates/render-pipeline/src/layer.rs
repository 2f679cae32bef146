//! Datasets handed to a draw cycle, and the requests derived from them.

use contour_engine::{ChunkSource, ContourGrid, ContourStyle, StrokeStyle};

/// One dataset to contour: its chunk source and how to draw it.
pub struct ContourLayer {
    pub name: String,
    pub style: ContourStyle,
    pub source: Box<dyn ChunkSource>,
}

impl ContourLayer {
    pub fn new(
        name: impl Into<String>,
        style: ContourStyle,
        source: impl ChunkSource + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            style,
            source: Box::new(source),
        }
    }
}

impl std::fmt::Debug for ContourLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContourLayer")
            .field("name", &self.name)
            .field("style", &self.style)
            .field("source", &self.source.name())
            .finish()
    }
}

/// A finished contour queued for drawing, tagged with the generation of the
/// cycle that produced it.
#[derive(Debug)]
pub struct DrawRequest {
    pub generation: u64,
    pub dataset: String,
    pub contour: ContourGrid,
    pub stroke: StrokeStyle,
}
