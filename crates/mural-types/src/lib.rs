//! Shared type definitions for the photo mural relay.
//!
//! This crate is the single source of truth for every type that crosses a
//! crate or process boundary: identifiers, grid coordinates, image records
//! and the JSON wire protocol spoken by the mural (display) and mobile
//! (controller) clients. Wire types derive `ts-rs` so the browser clients
//! can consume generated `TypeScript` definitions.
//!
//! # Modules
//!
//! - [`ids`] -- Validated image identifiers and per-connection session ids
//! - [`enums`] -- Roles, size classes and touch phases
//! - [`structs`] -- Records and payload structs (tiling params, URL data)
//! - [`protocol`] -- Inbound and outbound message enums, tagged by `type`

pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Role, SizeClass, TouchPhase};
pub use ids::{ImageId, InvalidImageId, SessionId};
pub use protocol::{ControllerMessage, DisplayMessage, ServerMessage};
pub use structs::{
    CellCoord, DerivativeUrls, FolderNames, ImageRecord, ImageUrlData, SnapShotData,
    TilingParams, TouchEvent,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the browser clients.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::ImageId::export_all();
        let _ = crate::ids::SessionId::export_all();

        let _ = crate::enums::Role::export_all();
        let _ = crate::enums::SizeClass::export_all();
        let _ = crate::enums::TouchPhase::export_all();

        let _ = crate::structs::CellCoord::export_all();
        let _ = crate::structs::TouchEvent::export_all();
        let _ = crate::structs::TilingParams::export_all();
        let _ = crate::structs::FolderNames::export_all();
        let _ = crate::structs::ImageUrlData::export_all();
        let _ = crate::structs::SnapShotData::export_all();
        let _ = crate::structs::DerivativeUrls::export_all();
        let _ = crate::structs::ImageRecord::export_all();

        let _ = crate::protocol::ControllerMessage::export_all();
        let _ = crate::protocol::DisplayMessage::export_all();
        let _ = crate::protocol::ServerMessage::export_all();
    }
}
