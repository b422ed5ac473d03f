//! Development listing generators.
//!
//! Filling a 20 x 11 mural with real captures takes a while, so during
//! development the bootstrap listing can be replaced by a single random
//! image repeated until the grid is full. Never used by the server.

use mural_types::{FolderNames, ImageUrlData};
use rand::seq::IndexedRandom;

/// Listing length that fills the default 20 x 11 grid.
pub const DEBUG_LISTING_LEN: usize = 220;

/// `count` copies of one file picked at random from `files`.
///
/// Returns an empty listing when `files` is empty.
pub fn repeated_listing(files: &[String], count: usize, rng: &mut impl rand::Rng) -> Vec<String> {
    files
        .choose(rng)
        .map(|file| vec![file.clone(); count])
        .unwrap_or_default()
}

/// A full `imageUrlData` payload built from [`repeated_listing`].
pub fn repeated_url_data(files: &[String], count: usize, rng: &mut impl rand::Rng) -> ImageUrlData {
    ImageUrlData {
        image_files: repeated_listing(files, count, rng),
        folders: FolderNames::standard(),
    }
}
