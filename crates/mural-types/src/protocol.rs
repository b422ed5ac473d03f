//! JSON wire protocol between the relay and its clients.
//!
//! Every frame is a JSON object tagged by `"type"` with the payload fields
//! at the top level:
//!
//! ```json
//! {"type": "touchEvent", "r": 1, "c": 2, "t": "touchmove"}
//! {"type": "imageSaved", "wasSuccessful": true}
//! ```
//!
//! | Type | Direction | Payload |
//! |------|-----------|---------|
//! | `snapShot` | controller -> relay | `snapShot`, `id` |
//! | `testSnapShot` | controller -> relay | `testSnapShot`, `id` |
//! | `requestTilingParams` | controller -> relay -> display | none |
//! | `muralTilingParams` | display -> relay -> controller | `muralTilingParams` |
//! | `requestImageUrlData` | either -> relay | none |
//! | `imageUrlData` | relay -> requesting role | `imageUrlData` |
//! | `imageSaved` | relay -> controllers | `wasSuccessful` |
//! | `newSnapShotData` | relay -> both roles | `newSnapShotData` |
//! | `touchEvent` | controller -> relay -> display | `r`, `c`, `t` |
//! | `userInputEvent` | controller -> relay -> display | none |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ImageId;
use crate::structs::{ImageUrlData, SnapShotData, TilingParams, TouchEvent};

/// Messages a controller (mobile client) sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ControllerMessage {
    /// A captured image, base64 encoded JPEG.
    #[serde(rename_all = "camelCase")]
    SnapShot {
        /// Base64 payload, optionally prefixed with a `data:` URL header.
        snap_shot: String,
        /// Client-chosen identifier, usually an ISO-8601 timestamp.
        id: ImageId,
    },
    /// A debug upload stored outside the grid.
    #[serde(rename_all = "camelCase")]
    TestSnapShot {
        /// Base64 payload.
        test_snap_shot: String,
        /// Client-chosen identifier.
        id: ImageId,
    },
    /// Ask a display for its tiling parameters.
    RequestTilingParams,
    /// Ask for the bootstrap image listing.
    RequestImageUrlData,
    /// A touch on the controller's touch pad.
    TouchEvent(TouchEvent),
    /// Any user activity, used by displays to cancel idle animation.
    UserInputEvent,
}

impl ControllerMessage {
    /// Wire name of the message type.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SnapShot { .. } => "snapShot",
            Self::TestSnapShot { .. } => "testSnapShot",
            Self::RequestTilingParams => "requestTilingParams",
            Self::RequestImageUrlData => "requestImageUrlData",
            Self::TouchEvent(_) => "touchEvent",
            Self::UserInputEvent => "userInputEvent",
        }
    }
}

/// Messages a display (mural client) sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum DisplayMessage {
    /// The display's answer to `requestTilingParams`.
    #[serde(rename_all = "camelCase")]
    MuralTilingParams {
        /// The reported parameters.
        mural_tiling_params: TilingParams,
    },
    /// Ask for the bootstrap image listing.
    RequestImageUrlData,
}

impl DisplayMessage {
    /// Wire name of the message type.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MuralTilingParams { .. } => "muralTilingParams",
            Self::RequestImageUrlData => "requestImageUrlData",
        }
    }
}

/// Messages the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Outcome of a snapshot submission, sent to every controller.
    #[serde(rename_all = "camelCase")]
    ImageSaved {
        /// `true` once every derivative was written.
        was_successful: bool,
    },
    /// Bootstrap listing for the requesting role.
    #[serde(rename_all = "camelCase")]
    ImageUrlData {
        /// The listing.
        image_url_data: ImageUrlData,
    },
    /// A new image entered the grid.
    #[serde(rename_all = "camelCase")]
    NewSnapShotData {
        /// The new image and its cell.
        new_snap_shot_data: SnapShotData,
    },
    /// Relay asks a display to report its tiling parameters.
    RequestTilingParams,
    /// Relayed tiling parameters, sent to controllers.
    #[serde(rename_all = "camelCase")]
    MuralTilingParams {
        /// The display's parameters.
        mural_tiling_params: TilingParams,
    },
    /// A de-duplicated touch event, sent to displays.
    TouchEvent(TouchEvent),
    /// Controller activity, sent to displays.
    UserInputEvent,
}

impl ServerMessage {
    /// Wire name of the message type.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ImageSaved { .. } => "imageSaved",
            Self::ImageUrlData { .. } => "imageUrlData",
            Self::NewSnapShotData { .. } => "newSnapShotData",
            Self::RequestTilingParams => "requestTilingParams",
            Self::MuralTilingParams { .. } => "muralTilingParams",
            Self::TouchEvent(_) => "touchEvent",
            Self::UserInputEvent => "userInputEvent",
        }
    }
}
