//! Dispatcher startup helper.
//!
//! Provides [`spawn_relay`] which builds the [`MessageRouter`] and runs it
//! on a background Tokio task. The returned sender goes into
//! [`AppState`](crate::AppState); once every clone of it is dropped the
//! dispatcher drains its queue and the task finishes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mural_relay::{spawn_relay, AppState};
//!
//! let (events, handle) = spawn_relay(grid, Arc::new(pipeline));
//! let state = Arc::new(AppState::new(events, "public"));
//! ```

use std::sync::Arc;

use mural_grid::TileGrid;
use mural_pipeline::{ImagePipeline, ImageStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dispatch::{MessageRouter, RouterEvent};

/// Spawn the dispatcher over `grid` and `pipeline`.
///
/// Returns the queue sender for sockets and handlers, and the task
/// handle so the caller can wait for the dispatcher on shutdown.
pub fn spawn_relay<S: ImageStore>(
    grid: TileGrid,
    pipeline: Arc<ImagePipeline<S>>,
) -> (mpsc::UnboundedSender<RouterEvent>, JoinHandle<()>) {
    let (events, queue) = mpsc::unbounded_channel();
    let router = MessageRouter::new(grid, pipeline, &events);
    let handle = tokio::spawn(router.run(queue));
    tracing::info!("Relay dispatcher spawned on background task");
    (events, handle)
}
