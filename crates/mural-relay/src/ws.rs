//! `WebSocket` handlers for displays and controllers.
//!
//! Displays connect to `GET /ws/display`, controllers to
//! `GET /ws/controller`. Each socket becomes one session:
//!
//! - a writer task drains the session's outbox and sends every
//!   [`ServerMessage`](mural_types::ServerMessage) as a JSON text frame;
//! - the reader loop decodes inbound text frames for the socket's role
//!   and posts them to the dispatcher. Frames that do not decode are
//!   logged and dropped; the client is not told.
//!
//! Ping frames are answered by the underlying `WebSocket` implementation.
//!
//! The socket closes when either half ends: the client going away stops
//! the reader, and the dispatcher dropping a stalled session's outbox (or
//! a write timing out) stops the writer.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use mural_types::{Role, SessionId};
use tracing::{debug, trace, warn};

use crate::dispatch::RouterEvent;
use crate::registry;
use crate::state::AppState;

/// How long one outbound frame may take to reach the client.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upgrade a mural display connection.
///
/// # Route
///
/// `GET /ws/display`
pub async fn ws_display(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state, Role::Display))
}

/// Upgrade a mobile controller connection.
///
/// # Route
///
/// `GET /ws/controller`
pub async fn ws_controller(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state, Role::Controller))
}

/// Decode one text frame sent by a client of `role`.
pub fn decode_frame(
    session: SessionId,
    role: Role,
    text: &str,
) -> Result<RouterEvent, serde_json::Error> {
    Ok(match role {
        Role::Controller => RouterEvent::Controller {
            session,
            message: serde_json::from_str(text)?,
        },
        Role::Display => RouterEvent::Display {
            session,
            message: serde_json::from_str(text)?,
        },
    })
}

/// Handle the `WebSocket` lifecycle: register, relay frames both ways,
/// unregister.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>, role: Role) {
    let session = SessionId::new();
    let (outbox, mut inbox) = registry::outbox();
    if let Err(e) = state.post(RouterEvent::Connected {
        session,
        role,
        outbox,
    }) {
        warn!(%session, %role, error = %e, "Rejecting WebSocket client");
        return;
    }
    debug!(%session, %role, "WebSocket client connected");

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(message) = inbox.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(j) => j,
                Err(e) => {
                    warn!(%session, kind = message.kind(), "Failed to serialize message: {e}");
                    continue;
                }
            };
            match tokio::time::timeout(WRITE_TIMEOUT, sink.send(Message::Text(json.into()))).await
            {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    debug!(%session, "WebSocket client disconnected (send failed)");
                    return;
                }
                Err(_) => {
                    warn!(%session, "WebSocket write timed out, closing");
                    return;
                }
            }
        }
        debug!(%session, "Outbox closed by dispatcher");
        if sink.close().await.is_err() {
            trace!(%session, "Close frame not delivered");
        }
    });

    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = &mut writer => break,
        };
        let Some(frame) = frame else { break };
        match frame {
            Ok(Message::Text(text)) => match decode_frame(session, role, text.as_str()) {
                Ok(event) => {
                    if state.post(event).is_err() {
                        debug!(%session, "Dispatcher closed, dropping WebSocket client");
                        break;
                    }
                }
                Err(e) => warn!(%session, %role, error = %e, "Dropping undecodable frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                // Binary, ping and pong frames carry nothing for the relay.
            }
            Err(e) => {
                debug!(%session, "WebSocket error: {e}");
                break;
            }
        }
    }

    if state.post(RouterEvent::Disconnected { session }).is_err() {
        trace!(%session, "Dispatcher already closed");
    }
    writer.abort();
    debug!(%session, %role, "WebSocket client disconnected");
}
