//! The storage seam.
//!
//! [`ImageStore`] abstracts where renditions live so the submission
//! coordinator can be exercised with an in-memory store that fails on
//! demand. [`DiskStore`] is the production implementation: plain files
//! under a [`StorageLayout`], with decoding and resizing done by the
//! `image` crate on the blocking thread pool.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use mural_types::{ImageId, SizeClass};
use tracing::debug;

use crate::error::PipelineError;
use crate::layout::StorageLayout;

/// A stored rendition found by [`ImageStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Identifier recovered from the file name.
    pub id: ImageId,
    /// Last modification time of the file.
    pub modified: DateTime<Utc>,
}

/// Persistent storage for originals and derivatives.
pub trait ImageStore: Send + Sync + 'static {
    /// Create any directories the store needs. Idempotent.
    fn prepare(&self) -> impl Future<Output = Result<(), PipelineError>> + Send;

    /// Persist the original upload of `id`, overwriting any previous one.
    fn write_original(
        &self,
        id: &ImageId,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;

    /// Derive every rendition in [`SizeClass::DERIVATIVES`] from the stored
    /// original of `id`.
    ///
    /// Yields one result per derivative, in `DERIVATIVES` order. The
    /// renditions are written independently, so one failing does not stop
    /// the others.
    fn write_derivatives(
        &self,
        id: &ImageId,
    ) -> impl Future<Output = Vec<Result<(), PipelineError>>> + Send;

    /// Remove every derivative of `id`. Missing files are not an error.
    fn discard_derivatives(
        &self,
        id: &ImageId,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;

    /// Persist a debug upload outside the size-class folders.
    fn write_test(
        &self,
        id: &ImageId,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;

    /// List the stored renditions of `class` in no particular order.
    fn list(
        &self,
        class: SizeClass,
    ) -> impl Future<Output = Result<Vec<StoredImage>, PipelineError>> + Send;
}

/// File-system store rooted at the public directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    layout: StorageLayout,
}

impl DiskStore {
    /// Store using `layout`.
    pub const fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// The layout this store writes to.
    pub const fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    async fn write_derivative(
        &self,
        id: &ImageId,
        class: SizeClass,
        decoded: Arc<DynamicImage>,
    ) -> Result<(), PipelineError> {
        let Some(edge) = class.edge_px() else {
            return Err(PipelineError::Derivative {
                id: id.clone(),
                class,
                message: String::from("size class has no fixed edge"),
            });
        };
        let dest = self.layout.path(class, id);

        let written = tokio::task::spawn_blocking(move || render_square(&decoded, &dest, edge))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?;

        written.map_err(|message| PipelineError::Derivative {
            id: id.clone(),
            class,
            message,
        })?;
        debug!(image_id = %id, class = %class, edge, "Derivative written");
        Ok(())
    }
}

impl ImageStore for DiskStore {
    async fn prepare(&self) -> Result<(), PipelineError> {
        for path in self.layout.all_dirs() {
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| PipelineError::Prepare { path, source })?;
        }
        Ok(())
    }

    async fn write_original(&self, id: &ImageId, bytes: Vec<u8>) -> Result<(), PipelineError> {
        let path = self.layout.path(SizeClass::Orig, id);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| PipelineError::Original {
                id: id.clone(),
                source,
            })?;
        debug!(image_id = %id, path = %path.display(), "Original written");
        Ok(())
    }

    async fn write_derivatives(&self, id: &ImageId) -> Vec<Result<(), PipelineError>> {
        // The original is decoded once and shared by every resize.
        let source = self.layout.path(SizeClass::Orig, id);
        let decoded = match tokio::task::spawn_blocking(move || decode_original(&source)).await {
            Ok(Ok(decoded)) => Arc::new(decoded),
            Ok(Err(message)) => {
                return SizeClass::DERIVATIVES
                    .iter()
                    .map(|class| {
                        Err(PipelineError::Derivative {
                            id: id.clone(),
                            class: *class,
                            message: message.clone(),
                        })
                    })
                    .collect();
            }
            Err(e) => {
                let message = e.to_string();
                return SizeClass::DERIVATIVES
                    .iter()
                    .map(|_| Err(PipelineError::Task(message.clone())))
                    .collect();
            }
        };

        join_all(
            SizeClass::DERIVATIVES
                .iter()
                .map(|class| self.write_derivative(id, *class, Arc::clone(&decoded))),
        )
        .await
    }

    async fn discard_derivatives(&self, id: &ImageId) -> Result<(), PipelineError> {
        let mut first_failure = None;
        for class in SizeClass::DERIVATIVES {
            match tokio::fs::remove_file(self.layout.path(class, id)).await {
                Ok(()) => debug!(image_id = %id, class = %class, "Derivative discarded"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    if first_failure.is_none() {
                        first_failure = Some(PipelineError::Discard {
                            id: id.clone(),
                            class,
                            source,
                        });
                    }
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    async fn write_test(&self, id: &ImageId, bytes: Vec<u8>) -> Result<(), PipelineError> {
        tokio::fs::write(self.layout.test_path(id), bytes)
            .await
            .map_err(|source| PipelineError::TestSnapShot {
                id: id.clone(),
                source,
            })
    }

    async fn list(&self, class: SizeClass) -> Result<Vec<StoredImage>, PipelineError> {
        let listing_error = |source| PipelineError::Listing { class, source };
        let mut entries = tokio::fs::read_dir(self.layout.dir(class))
            .await
            .map_err(listing_error)?;

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
            let Some(id) = entry.file_name().to_str().and_then(ImageId::from_file_name) else {
                continue;
            };
            let metadata = entry.metadata().await.map_err(listing_error)?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(listing_error)?;
            images.push(StoredImage {
                id,
                modified: DateTime::<Utc>::from(modified),
            });
        }
        Ok(images)
    }
}

/// Decode the stored original at `source`.
fn decode_original(source: &Path) -> Result<DynamicImage, String> {
    ImageReader::open(source)
        .map_err(|e| format!("open {}: {e}", source.display()))?
        .with_guessed_format()
        .map_err(|e| format!("guess format of {}: {e}", source.display()))?
        .decode()
        .map_err(|e| format!("decode {}: {e}", source.display()))
}

/// Center-crop and scale `decoded` to `edge` x `edge` and write it to
/// `dest` as JPEG.
fn render_square(decoded: &DynamicImage, dest: &Path, edge: u32) -> Result<(), String> {
    // JPEG has no alpha channel.
    let square = DynamicImage::ImageRgb8(
        decoded
            .resize_to_fill(edge, edge, FilterType::Triangle)
            .to_rgb8(),
    );
    square
        .save_with_format(dest, ImageFormat::Jpeg)
        .map_err(|e| format!("encode {}: {e}", dest.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{GenericImageView, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn one_decoded_image_renders_every_edge() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 200, Rgba([9, 80, 200, 255])));

        for class in SizeClass::DERIVATIVES {
            let edge = class.edge_px().unwrap();
            let dest = dir.path().join(format!("{class}.jpg"));
            render_square(&decoded, &dest, edge).unwrap();
            assert_eq!(image::open(&dest).unwrap().dimensions(), (edge, edge));
        }
    }

    #[test]
    fn undecodable_original_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, b"not an image").unwrap();

        assert!(decode_original(&source).is_err());
        assert!(decode_original(&dir.path().join("missing.jpg")).is_err());
    }
}
