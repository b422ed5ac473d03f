//! Submission coordinator and bootstrap listing.
//!
//! A submission writes the original first. Only if that succeeds are the
//! three derivatives issued, as one joined set of independent resize
//! operations; the submission succeeds once all of them have resolved
//! successfully. When any of them fails, the ones that were written are
//! discarded again. The returned [`ImageRecord`] is the only thing callers
//! ever insert into the grid, so a failed derivative can never surface a
//! partial image.

use std::collections::HashSet;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use mural_types::{FolderNames, ImageId, ImageRecord, ImageUrlData, SizeClass};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::store::{ImageStore, StoredImage};

/// Coordinates storage of snapshots through an [`ImageStore`].
#[derive(Debug)]
pub struct ImagePipeline<S> {
    store: S,
}

impl<S: ImageStore> ImagePipeline<S> {
    /// Pipeline writing through `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create the storage directories.
    pub async fn prepare(&self) -> Result<(), PipelineError> {
        self.store.prepare().await
    }

    /// Store a captured image and all of its derivatives.
    ///
    /// `payload` is base64, optionally prefixed with a `data:` URL header.
    /// An existing image with the same id is overwritten.
    pub async fn submit(&self, payload: &str, id: ImageId) -> Result<ImageRecord, PipelineError> {
        let bytes = decode_payload(payload)?;
        let size = bytes.len();
        self.store.write_original(&id, bytes).await?;

        let mut first_failure = None;
        for result in self.store.write_derivatives(&id).await {
            if let Err(e) = result {
                warn!(image_id = %id, error = %e, "Derivative failed");
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
        if let Some(e) = first_failure {
            // Siblings that did get written must not surface in a listing.
            if let Err(discard) = self.store.discard_derivatives(&id).await {
                warn!(image_id = %id, error = %discard, "Failed to discard derivatives");
            }
            return Err(e);
        }

        info!(image_id = %id, bytes = size, "Snapshot stored");
        Ok(ImageRecord::new(id, Utc::now()))
    }

    /// Store a debug upload. Nothing derived, nothing listed.
    pub async fn submit_test(&self, payload: &str, id: &ImageId) -> Result<(), PipelineError> {
        let bytes = decode_payload(payload)?;
        self.store.write_test(id, bytes).await?;
        debug!(image_id = %id, "Test snapshot stored");
        Ok(())
    }

    /// The newest `capacity` complete images, oldest first.
    ///
    /// An image counts only if its small and tiny derivatives exist next
    /// to the full-size one. Ordered by the full-size file's modification
    /// time with the id as tie-break; older overflow is dropped.
    pub async fn recent_images(&self, capacity: usize) -> Result<Vec<StoredImage>, PipelineError> {
        let small = self.listed_ids(SizeClass::Small).await?;
        let tiny = self.listed_ids(SizeClass::Tiny).await?;
        let mut images = self.store.list(SizeClass::Full).await?;
        images.retain(|image| {
            let complete = small.contains(&image.id) && tiny.contains(&image.id);
            if !complete {
                debug!(image_id = %image.id, "Skipping image with missing derivatives");
            }
            complete
        });
        images.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.id.cmp(&b.id)));
        let overflow = images.len().saturating_sub(capacity);
        if overflow > 0 {
            debug!(overflow, capacity, "Dropping older images from listing");
        }
        images.drain(..overflow);
        Ok(images)
    }

    async fn listed_ids(&self, class: SizeClass) -> Result<HashSet<ImageId>, PipelineError> {
        let images = self.store.list(class).await?;
        Ok(images.into_iter().map(|image| image.id).collect())
    }

    /// The bootstrap listing in `imageUrlData` shape.
    pub async fn image_url_data(&self, capacity: usize) -> Result<ImageUrlData, PipelineError> {
        let images = self.recent_images(capacity).await?;
        Ok(ImageUrlData {
            image_files: images.iter().map(|image| image.id.file_name()).collect(),
            folders: FolderNames::standard(),
        })
    }

    /// Records to seed the grid with on cold start, oldest first.
    pub async fn bootstrap_records(
        &self,
        capacity: usize,
    ) -> Result<Vec<ImageRecord>, PipelineError> {
        let images = self.recent_images(capacity).await?;
        Ok(images
            .into_iter()
            .map(|image| ImageRecord::new(image.id, image.modified))
            .collect())
    }
}

/// Decode a base64 snapshot payload.
///
/// Browser clients send `canvas.toDataURL()` output, so anything up to and
/// including the first comma of a `data:` URL is ignored.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, PipelineError> {
    let body = if payload.starts_with("data:") {
        payload.split_once(',').map_or("", |(_, body)| body)
    } else {
        payload
    };
    let bytes = STANDARD.decode(body.trim())?;
    if bytes.is_empty() {
        return Err(PipelineError::EmptyPayload);
    }
    Ok(bytes)
}
