//! Relay server for the photo mural.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoints** (`/ws/controller`, `/ws/display`) speaking
//!   the JSON protocol defined in [`mural_types::protocol`]
//! - **Status endpoints** (`GET /`, `GET /api/status`) reporting session
//!   counts and grid occupancy
//! - **Static files** from the public root, including the stored
//!   snapshot derivatives the displays load by URL
//!
//! # Architecture
//!
//! Every socket posts its decoded messages into one queue owned by the
//! [`MessageRouter`]. The router is the only owner of the tile grid, the
//! [`SessionRegistry`] and the [`TouchDeduplicator`], and handles one
//! [`RouterEvent`] at a time. Pipeline work (writing derivatives) runs on
//! spawned tasks that post their outcome back into the same queue, so a
//! grid insertion and the broadcasts it triggers always happen as one step.
//! Image listings are answered from the grid itself.

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod touch;
pub mod ws;

// Re-export primary types for convenience.
pub use dispatch::{MessageRouter, RelayStatus, RouterEvent};
pub use error::RelayError;
pub use registry::{Delivery, OUTBOX_CAPACITY, Outbox, SessionRegistry, outbox};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_relay;
pub use state::AppState;
pub use touch::TouchDeduplicator;
