//! Integration tests for the disk-backed pipeline.
//!
//! Each test runs against a fresh temporary public root and a small
//! generated JPEG, so the real `image` decode/resize/encode path is
//! exercised end to end.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use mural_pipeline::{DiskStore, ImagePipeline, PipelineError, StorageLayout};
use mural_types::{ImageId, SizeClass};
use tempfile::TempDir;

fn jpeg_payload(width: u32, height: u32) -> String {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([180, 40, 90])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    format!("data:image/jpeg;base64,{}", STANDARD.encode(buf))
}

async fn pipeline() -> (TempDir, ImagePipeline<DiskStore>) {
    let root = TempDir::new().unwrap();
    let pipeline = ImagePipeline::new(DiskStore::new(StorageLayout::new(root.path())));
    pipeline.prepare().await.unwrap();
    (root, pipeline)
}

#[tokio::test]
async fn prepare_creates_every_folder() {
    let (root, pipeline) = pipeline().await;
    for dir in pipeline.store().layout().all_dirs() {
        assert!(dir.is_dir(), "{} missing", dir.display());
        assert!(dir.starts_with(root.path()));
    }
}

#[tokio::test]
async fn submit_writes_square_derivatives() {
    let (_root, pipeline) = pipeline().await;
    let id = ImageId::parse("2016-03-01T12:00:00.000Z").unwrap();

    let record = pipeline.submit(&jpeg_payload(640, 480), id.clone()).await.unwrap();
    assert_eq!(record.urls.small, "/snapShots/snapShots_small/2016-03-01T12:00:00.000Z.jpg");

    let layout = pipeline.store().layout();
    assert!(layout.path(SizeClass::Orig, &id).is_file());
    for class in SizeClass::DERIVATIVES {
        let edge = class.edge_px().unwrap();
        let derived = image::open(layout.path(class, &id)).unwrap();
        assert_eq!(derived.dimensions(), (edge, edge), "{class} derivative");
    }
}

#[tokio::test]
async fn undecodable_original_fails_submission() {
    let (_root, pipeline) = pipeline().await;
    let id = ImageId::parse("garbage").unwrap();
    let payload = STANDARD.encode(b"definitely not a jpeg");

    let result = pipeline.submit(&payload, id.clone()).await;
    assert!(matches!(result, Err(PipelineError::Derivative { .. })));

    // The original is kept; no derivative was produced.
    let layout = pipeline.store().layout();
    assert!(layout.path(SizeClass::Orig, &id).is_file());
    assert!(!layout.path(SizeClass::Full, &id).exists());
    assert!(pipeline.recent_images(220).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_derivative_is_discarded_and_never_listed() {
    let (_root, pipeline) = pipeline().await;
    let layout = pipeline.store().layout().clone();
    std::fs::remove_dir_all(layout.dir(SizeClass::Small)).unwrap();
    let id = ImageId::parse("partial").unwrap();

    let result = pipeline.submit(&jpeg_payload(64, 64), id.clone()).await;
    assert!(matches!(
        result,
        Err(PipelineError::Derivative {
            class: SizeClass::Small,
            ..
        })
    ));

    // Full and tiny were rendered, then removed again.
    assert!(!layout.path(SizeClass::Full, &id).exists());
    assert!(!layout.path(SizeClass::Tiny, &id).exists());

    pipeline.prepare().await.unwrap();
    assert!(pipeline.bootstrap_records(220).await.unwrap().is_empty());
    assert!(pipeline.image_url_data(220).await.unwrap().image_files.is_empty());
}

#[tokio::test]
async fn full_size_file_without_siblings_is_not_listed() {
    let (_root, pipeline) = pipeline().await;
    let payload = jpeg_payload(40, 40);
    pipeline
        .submit(&payload, ImageId::parse("whole").unwrap())
        .await
        .unwrap();
    let layout = pipeline.store().layout();
    let stray = ImageId::parse("stray").unwrap();
    std::fs::copy(
        layout.path(SizeClass::Full, &ImageId::parse("whole").unwrap()),
        layout.path(SizeClass::Full, &stray),
    )
    .unwrap();

    let data = pipeline.image_url_data(220).await.unwrap();
    assert_eq!(data.image_files, vec!["whole.jpg"]);
}

#[tokio::test]
async fn listing_is_capped_and_ignores_other_files() {
    let (_root, pipeline) = pipeline().await;
    let payload = jpeg_payload(40, 40);
    for name in ["a", "b", "c"] {
        pipeline
            .submit(&payload, ImageId::parse(name).unwrap())
            .await
            .unwrap();
    }
    let full_dir = pipeline.store().layout().dir(SizeClass::Full);
    std::fs::write(full_dir.join("notes.txt"), b"ignored").unwrap();
    std::fs::create_dir(full_dir.join("nested.jpg")).unwrap();

    let all = pipeline.recent_images(220).await.unwrap();
    assert_eq!(all.len(), 3);

    let capped = pipeline.image_url_data(2).await.unwrap();
    assert_eq!(capped.image_files.len(), 2);
    assert_eq!(capped.folders.full_folder_name, "/snapShots/snapShots_full");
}

#[tokio::test]
async fn test_snapshots_stay_out_of_listing() {
    let (_root, pipeline) = pipeline().await;
    let id = ImageId::parse("debug").unwrap();

    pipeline.submit_test(&jpeg_payload(8, 8), &id).await.unwrap();

    assert!(pipeline.store().layout().test_path(&id).is_file());
    assert!(pipeline.recent_images(220).await.unwrap().is_empty());
}
