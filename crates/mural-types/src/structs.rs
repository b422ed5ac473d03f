//! Record and payload structs.
//!
//! Field names follow the camelCase keys the browser clients already
//! read (`numColumns`, `imageFileName`, ...). The touch event keeps its
//! single-letter keys because move events are sent at high frequency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{SizeClass, TouchPhase};
use crate::ids::ImageId;

// ---------------------------------------------------------------------------
// Grid geometry
// ---------------------------------------------------------------------------

/// A (row, column) position in the tile grid. Row 0 holds the oldest images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CellCoord {
    /// Zero-based row index.
    pub row: u32,
    /// Zero-based column index.
    pub column: u32,
}

impl CellCoord {
    /// Build a coordinate.
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl core::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// A touch on one tile of a controller's touch pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TouchEvent {
    /// Row of the touched tile.
    #[serde(rename = "r")]
    pub row: u32,
    /// Column of the touched tile.
    #[serde(rename = "c")]
    pub column: u32,
    /// Gesture phase.
    #[serde(rename = "t")]
    pub phase: TouchPhase,
}

impl TouchEvent {
    /// Build a touch event.
    pub const fn new(row: u32, column: u32, phase: TouchPhase) -> Self {
        Self { row, column, phase }
    }

    /// The touched cell.
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.row, self.column)
    }
}

/// Grid dimensions plus current occupancy.
///
/// Displays report the first two fields; `numRows` and `numImages` are
/// filled in when known and default to zero otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TilingParams {
    /// Fixed column count `C`.
    pub num_columns: u32,
    /// Maximum row count `R`.
    pub max_num_rows: u32,
    /// Rows currently in use, `ceil(numImages / numColumns)`.
    #[serde(default)]
    pub num_rows: u32,
    /// Occupied cells.
    #[serde(default)]
    pub num_images: u32,
}

// ---------------------------------------------------------------------------
// Image URL payloads
// ---------------------------------------------------------------------------

/// Public folder URLs of the three derivative size classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FolderNames {
    /// Folder URL of the 512px derivatives.
    pub full_folder_name: String,
    /// Folder URL of the 96px derivatives.
    pub small_folder_name: String,
    /// Folder URL of the 32px derivatives.
    pub tiny_folder_name: String,
}

impl FolderNames {
    /// The folder URLs served by the relay, e.g. `/snapShots/snapShots_full`.
    pub fn standard() -> Self {
        Self {
            full_folder_name: folder_url(SizeClass::Full),
            small_folder_name: folder_url(SizeClass::Small),
            tiny_folder_name: folder_url(SizeClass::Tiny),
        }
    }
}

impl Default for FolderNames {
    fn default() -> Self {
        Self::standard()
    }
}

/// Public URL of the folder holding a size class.
pub fn folder_url(class: SizeClass) -> String {
    format!("/{}", class.folder_name())
}

/// Bootstrap payload: the most recent image files, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ImageUrlData {
    /// File names (`<id>.jpg`) in grid order.
    pub image_files: Vec<String>,
    /// Derivative folder URLs.
    #[serde(flatten)]
    pub folders: FolderNames,
}

/// Payload announcing a newly inserted image.
///
/// `row`, `column` and `evicted` describe the grid delta; clients that
/// only read the file and folder names keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SnapShotData {
    /// File name (`<id>.jpg`) of the new image.
    pub image_file_name: String,
    /// Derivative folder URLs.
    #[serde(flatten)]
    pub folders: FolderNames,
    /// Row of the new cell after any eviction.
    pub row: u32,
    /// Column of the new cell.
    pub column: u32,
    /// Whether the oldest row was evicted to make room.
    pub evicted: bool,
}

// ---------------------------------------------------------------------------
// Image records
// ---------------------------------------------------------------------------

/// Public URLs of the three derivatives of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DerivativeUrls {
    /// URL of the 512px derivative.
    pub full: String,
    /// URL of the 96px derivative.
    pub small: String,
    /// URL of the 32px derivative.
    pub tiny: String,
}

impl DerivativeUrls {
    /// URLs of the derivatives of `id`, e.g. `/snapShots/snapShots_full/<id>.jpg`.
    pub fn for_id(id: &ImageId) -> Self {
        Self {
            full: image_url(SizeClass::Full, id),
            small: image_url(SizeClass::Small, id),
            tiny: image_url(SizeClass::Tiny, id),
        }
    }
}

/// Public URL of one rendition of an image.
pub fn image_url(class: SizeClass, id: &ImageId) -> String {
    format!("/{}/{}", class.folder_name(), id.file_name())
}

/// An image whose derivatives all exist on disk. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ImageRecord {
    /// Client-chosen identifier.
    pub id: ImageId,
    /// Stored file name, `<id>.jpg`.
    pub file_name: String,
    /// Derivative URLs.
    pub urls: DerivativeUrls,
    /// When the derivatives were completed (or the file's mtime at bootstrap).
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    /// Build the record for `id`, deriving file name and URLs.
    pub fn new(id: ImageId, created_at: DateTime<Utc>) -> Self {
        Self {
            file_name: id.file_name(),
            urls: DerivativeUrls::for_id(&id),
            id,
            created_at,
        }
    }
}
