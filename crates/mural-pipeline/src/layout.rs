//! On-disk layout of stored snapshots.
//!
//! ```text
//! <root>/snapShots/snapShots_orig/<id>.jpg    as uploaded
//! <root>/snapShots/snapShots_full/<id>.jpg    512px square
//! <root>/snapShots/snapShots_small/<id>.jpg   96px square
//! <root>/snapShots/snapShots_tiny/<id>.jpg    32px square
//! <root>/testSnapShots/<id>.jpg               debug uploads
//! ```
//!
//! `<root>` is the public root served over HTTP, so the URL of a file is
//! its path relative to the root.

use std::path::{Path, PathBuf};

use mural_types::{ImageId, SizeClass};

/// Folder (relative to the root) receiving debug uploads.
pub const TEST_FOLDER: &str = "testSnapShots";

/// Maps size classes and image ids to paths under a public root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The public root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `class`.
    pub fn dir(&self, class: SizeClass) -> PathBuf {
        self.root.join(class.folder_name())
    }

    /// File holding the `class` rendition of `id`.
    pub fn path(&self, class: SizeClass, id: &ImageId) -> PathBuf {
        self.dir(class).join(id.file_name())
    }

    /// Directory receiving debug uploads.
    pub fn test_dir(&self) -> PathBuf {
        self.root.join(TEST_FOLDER)
    }

    /// File holding the debug upload `id`.
    pub fn test_path(&self, id: &ImageId) -> PathBuf {
        self.test_dir().join(id.file_name())
    }

    /// Every directory the pipeline writes to.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = SizeClass::ALL.iter().map(|c| self.dir(*c)).collect();
        dirs.push(self.test_dir());
        dirs
    }
}
