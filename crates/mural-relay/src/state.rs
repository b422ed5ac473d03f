//! Shared application state for the relay's HTTP layer.
//!
//! Handlers never hold relay state themselves. [`AppState`] carries the
//! sending half of the dispatcher queue; reads such as the status page
//! are answered by the dispatcher over a oneshot reply channel.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::dispatch::{RelayStatus, RouterEvent};
use crate::error::RelayError;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Queue into the dispatcher task.
    pub events: mpsc::UnboundedSender<RouterEvent>,
    /// Directory served as static files (client pages and snapshots).
    pub public_root: PathBuf,
}

impl AppState {
    /// State posting into `events` and serving `public_root`.
    pub fn new(events: mpsc::UnboundedSender<RouterEvent>, public_root: impl Into<PathBuf>) -> Self {
        Self {
            events,
            public_root: public_root.into(),
        }
    }

    /// Hand `event` to the dispatcher.
    pub fn post(&self, event: RouterEvent) -> Result<(), RelayError> {
        if self.events.send(event).is_err() {
            return Err(RelayError::DispatcherClosed);
        }
        Ok(())
    }

    /// Ask the dispatcher for a status report.
    pub async fn status(&self) -> Result<RelayStatus, RelayError> {
        let (reply, answer) = oneshot::channel();
        self.post(RouterEvent::Status { reply })?;
        Ok(answer.await?)
    }
}
