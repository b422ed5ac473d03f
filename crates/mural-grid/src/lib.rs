//! Bounded tile grid for the photo mural.
//!
//! The grid maps an unbounded stream of images onto `C` columns and at most
//! `R` rows. Images fill row-major in arrival order; when the grid is full
//! the oldest row is evicted as a unit and every surviving cell moves up
//! one row. Every display replicates the same transitions, so this crate
//! is pure state with no transport or rendering concerns.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid construction.
//! - [`tiling`] -- [`GridDimensions`] and the [`TileGrid`] state machine.

pub mod error;
pub mod tiling;

// Re-export primary types at crate root.
pub use error::GridError;
pub use tiling::{EvictedRow, GridDimensions, GridPhase, Insertion, TileGrid};
