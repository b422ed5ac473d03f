//! Axum router construction for the relay.
//!
//! Assembles the `WebSocket` endpoints, the status routes and the static
//! file service into a single [`Router`] with CORS enabled, since the
//! mural and mobile pages may be served from another origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the relay.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/status` -- JSON status
/// - `GET /ws/display` -- `WebSocket` for mural displays
/// - `GET /ws/controller` -- `WebSocket` for mobile controllers
/// - any other path -- static files under the public root, including
///   `/snapShots/snapShots_<class>/<id>.jpg`
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.public_root);

    Router::new()
        // Status
        .route("/", get(handlers::index))
        .route("/api/status", get(handlers::get_status))
        // WebSocket
        .route("/ws/display", get(ws::ws_display))
        .route("/ws/controller", get(ws::ws_controller))
        // Snapshots and client pages
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
