//! Error types for the `mural-pipeline` crate.
//!
//! Every variant maps to a failed submission or listing; none of them ever
//! reaches the grid. The relay reports submission failures to controllers
//! as `imageSaved { wasSuccessful: false }`.

use std::path::PathBuf;

use mural_types::{ImageId, SizeClass};

/// Errors that can occur while storing or listing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Payload(#[from] base64::DecodeError),

    /// The payload decoded to zero bytes.
    #[error("empty image payload")]
    EmptyPayload,

    /// Creating a storage directory failed.
    #[error("failed to prepare storage directory {path}: {source}")]
    Prepare {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the original upload failed; no derivative was attempted.
    #[error("failed to write original of {id}: {source}")]
    Original {
        /// The image being stored.
        id: ImageId,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Decoding, resizing or writing one derivative failed.
    #[error("failed to write {class} derivative of {id}: {message}")]
    Derivative {
        /// The image being stored.
        id: ImageId,
        /// The derivative that failed.
        class: SizeClass,
        /// Description of the failure.
        message: String,
    },

    /// Writing a debug upload failed.
    #[error("failed to write test snapshot {id}: {source}")]
    TestSnapShot {
        /// The image being stored.
        id: ImageId,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading a size-class directory failed.
    #[error("failed to list {class} images: {source}")]
    Listing {
        /// The directory's size class.
        class: SizeClass,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Removing the derivatives of a failed submission failed.
    #[error("failed to discard {class} derivative of {id}: {source}")]
    Discard {
        /// The image being discarded.
        id: ImageId,
        /// The derivative that could not be removed.
        class: SizeClass,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A blocking decode or resize task panicked or was cancelled.
    #[error("resize task failed: {0}")]
    Task(String),
}
