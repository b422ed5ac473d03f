//! Snapshot storage and derivative generation for the photo mural.
//!
//! A captured image arrives as a base64 string with a client-chosen id.
//! The [`ImagePipeline`] writes the original, derives the 512px, 96px and
//! 32px square renditions, and hands back an [`ImageRecord`] only once all
//! three exist. The same directories are listed on cold start to rebuild
//! the grid from the newest images.
//!
//! # Modules
//!
//! - [`error`] -- [`PipelineError`] for payload, storage and listing failures.
//! - [`layout`] -- [`StorageLayout`]: on-disk folder per size class.
//! - [`store`] -- The [`ImageStore`] seam and its [`DiskStore`] implementation.
//! - [`pipeline`] -- The submission coordinator and bootstrap listing.
//! - `fixture` -- Development listing generators (feature `fixtures`).
//!
//! [`ImageRecord`]: mural_types::ImageRecord

pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
pub mod layout;
pub mod pipeline;
pub mod store;

// Re-export primary types at crate root.
pub use error::PipelineError;
pub use layout::StorageLayout;
pub use pipeline::{ImagePipeline, decode_payload};
pub use store::{DiskStore, ImageStore, StoredImage};
