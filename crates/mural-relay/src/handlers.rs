//! HTTP endpoint handlers for the relay.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Session counts and grid occupancy as JSON |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::error::RelayError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with live session counts and grid occupancy.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, RelayError> {
    let status = state.status().await?;
    let displays = status.displays;
    let controllers = status.controllers;
    let images = status.tiling.num_images;
    let rows = status.tiling.num_rows;
    let columns = status.tiling.num_columns;
    let max_rows = status.tiling.max_num_rows;
    let phase = format!("{:?}", status.phase);

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Photo Mural Relay</title>
    <style>
        body {{
            background: #101418;
            color: #d0d7de;
            font-family: 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 760px;
            margin: 0 auto;
        }}
        h1 {{ color: #f0883e; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 110px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #f0883e; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #f0883e; text-decoration: none; }}
        code {{ color: #7ee787; }}
    </style>
</head>
<body>
    <h1>Photo Mural Relay</h1>

    <div>
        <div class="metric"><div class="label">Displays</div><div class="value">{displays}</div></div>
        <div class="metric"><div class="label">Controllers</div><div class="value">{controllers}</div></div>
        <div class="metric"><div class="label">Images</div><div class="value">{images}</div></div>
        <div class="metric"><div class="label">Rows</div><div class="value">{rows} / {max_rows}</div></div>
        <div class="metric"><div class="label">Columns</div><div class="value">{columns}</div></div>
        <div class="metric"><div class="label">Grid</div><div class="value">{phase}</div></div>
    </div>

    <h2>Endpoints</h2>
    <p><a href="/api/status">/api/status</a> -- JSON status</p>
    <p><code>ws://host:port/ws/display</code> -- mural display socket</p>
    <p><code>ws://host:port/ws/controller</code> -- mobile controller socket</p>
</body>
</html>"#
    )))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return session counts, grid phase and tiling parameters.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, RelayError> {
    let status = state.status().await?;
    Ok(Json(serde_json::to_value(status)?))
}
