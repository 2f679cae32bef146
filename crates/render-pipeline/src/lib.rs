//! Asynchronous contour rendering pipeline.
//!
//! A draw cycle runs two stages connected by a bounded queue:
//!
//! ```text
//! ChunkSource ──► Generator (rayon pool, one task per dataset)
//!                   │ extract_cells per chunk / polarity / level
//!                   ▼
//!             bounded mpsc queue (backpressure)
//!                   │
//!                   ▼
//!             Drawer (tokio task) ──► surface owner thread ──► walk()
//! ```
//!
//! Every request carries the generation of the cycle that produced it.
//! Starting a new cycle or cancelling advances the generation; the surface
//! owner rejects anything older, so frames from different cycles never
//! mix on the surface.
//!
//! [`render_immediate`] is the synchronous alternative for snapshots.

pub mod cancel;
pub mod config;
mod drawer;
pub mod error;
mod generator;
pub mod immediate;
pub mod layer;
pub mod pipeline;
pub mod stats;
mod surface_actor;

pub use cancel::{CancelToken, GenerationCounter};
pub use config::{ImmediateMode, PipelineConfig};
pub use error::{PipelineError, Result};
pub use immediate::{render_immediate, ImmediateReport};
pub use layer::{ContourLayer, DrawRequest};
pub use pipeline::{ContourPipeline, DrawCycle, PipelineState};
pub use stats::{CycleReport, PipelineStats, StatsSnapshot};
pub use surface_actor::DrawOutcome;
