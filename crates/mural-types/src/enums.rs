//! Enumeration types shared by the relay and its clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Root folder (relative to the public root) holding all snapshot folders.
pub const SNAPSHOT_ROOT_FOLDER: &str = "snapShots";

// ---------------------------------------------------------------------------
// Session roles
// ---------------------------------------------------------------------------

/// The role a connected client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// A large-format mural rendering the image grid.
    Display,
    /// A mobile client capturing snapshots and acting as a touch remote.
    Controller,
}

impl Role {
    /// Both roles, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Display, Self::Controller];

    /// Lowercase name used in logs and routes.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Controller => "controller",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Image size classes
// ---------------------------------------------------------------------------

/// A stored rendition of a captured image.
///
/// `Orig` is the upload as received; the other three are square
/// derivatives at a fixed edge length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum SizeClass {
    /// The original upload.
    Orig,
    /// 512px square, shown when the mural zooms into a tile.
    Full,
    /// 96px square, used for grid tiles.
    Small,
    /// 32px square, used for the mobile touch pad.
    Tiny,
}

impl SizeClass {
    /// Every size class, original first.
    pub const ALL: [Self; 4] = [Self::Orig, Self::Full, Self::Small, Self::Tiny];

    /// The derived size classes, largest first.
    pub const DERIVATIVES: [Self; 3] = [Self::Full, Self::Small, Self::Tiny];

    /// Folder (relative to the public root) holding this size class.
    ///
    /// The public URL path mirrors the folder name.
    pub const fn folder_name(self) -> &'static str {
        match self {
            Self::Orig => "snapShots/snapShots_orig",
            Self::Full => "snapShots/snapShots_full",
            Self::Small => "snapShots/snapShots_small",
            Self::Tiny => "snapShots/snapShots_tiny",
        }
    }

    /// Edge length in pixels of the square derivative, `None` for `Orig`.
    pub const fn edge_px(self) -> Option<u32> {
        match self {
            Self::Orig => None,
            Self::Full => Some(512),
            Self::Small => Some(96),
            Self::Tiny => Some(32),
        }
    }

    /// Lowercase name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orig => "orig",
            Self::Full => "full",
            Self::Small => "small",
            Self::Tiny => "tiny",
        }
    }
}

impl core::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Touch phases
// ---------------------------------------------------------------------------

/// Phase of a touch gesture on a controller's touch pad.
///
/// Serialized with the DOM event names the browser clients already use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TouchPhase {
    /// Finger down on a tile.
    #[serde(rename = "touchstart")]
    Start,
    /// Finger moving across the pad.
    #[serde(rename = "touchmove")]
    Move,
    /// Finger lifted.
    #[serde(rename = "touchend")]
    End,
}
