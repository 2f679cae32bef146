//! Shared test utilities for the spectrum-contours workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic spectrum generators
//! - A rendering surface that records every call
//! - Chunk sources that fail or stall on demand
//! - Common style and window fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, RecordingSurface};
//! ```

pub mod fixtures;
pub mod generators;
pub mod sources;
pub mod surfaces;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use sources::*;
pub use surfaces::*;
