//! Identifier types.
//!
//! [`ImageId`] is chosen by the capturing client (usually an ISO-8601
//! timestamp) and doubles as a file stem on disk, so it is validated on
//! construction and on deserialization. [`SessionId`] is server-assigned,
//! one per live `WebSocket` connection, using UUID v7 so ids sort by
//! connection time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Maximum length of an image identifier in bytes.
pub const MAX_IMAGE_ID_LEN: usize = 200;

/// File extension used for every stored image and derivative.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Reasons an image identifier is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidImageId {
    /// The identifier is empty.
    #[error("image id is empty")]
    Empty,

    /// The identifier exceeds [`MAX_IMAGE_ID_LEN`] bytes.
    #[error("image id is {len} bytes, limit is {MAX_IMAGE_ID_LEN}")]
    TooLong {
        /// Actual length in bytes.
        len: usize,
    },

    /// The identifier contains a path separator or control character.
    #[error("image id contains forbidden character {ch:?}")]
    ForbiddenCharacter {
        /// The offending character.
        ch: char,
    },

    /// The identifier starts with a dot (hidden file or relative path).
    #[error("image id must not start with '.'")]
    LeadingDot,
}

/// Client-chosen identifier of a captured image.
///
/// Safe to use as a file stem: non-empty, bounded length, no path
/// separators, no control characters, no leading dot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export, export_to = "bindings/")]
pub struct ImageId(String);

impl ImageId {
    /// Validate and wrap a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidImageId`] describing the first rule the input breaks.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidImageId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidImageId::Empty);
        }
        if raw.len() > MAX_IMAGE_ID_LEN {
            return Err(InvalidImageId::TooLong { len: raw.len() });
        }
        if let Some(ch) = raw
            .chars()
            .find(|ch| matches!(ch, '/' | '\\') || ch.is_control())
        {
            return Err(InvalidImageId::ForbiddenCharacter { ch });
        }
        if raw.starts_with('.') {
            return Err(InvalidImageId::LeadingDot);
        }
        Ok(Self(raw))
    }

    /// Recover an identifier from a stored file name such as `abc.jpg`.
    ///
    /// Returns `None` for other extensions or invalid stems.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if ext != IMAGE_EXTENSION {
            return None;
        }
        Self::parse(stem).ok()
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name under which the image and all derivatives are stored.
    pub fn file_name(&self) -> String {
        format!("{}.{IMAGE_EXTENSION}", self.0)
    }
}

impl TryFrom<String> for ImageId {
    type Error = InvalidImageId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl core::fmt::Display for ImageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one live connection, display or controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
