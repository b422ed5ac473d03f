//! Relay binary for the photo mural.
//!
//! Wires the image pipeline, the tile grid and the relay together and
//! serves the display and controller sockets until shut down.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `mural-config.yaml` (or `MURAL_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the snapshot folders under the public root
//! 4. Rebuild the grid from the newest stored images
//! 5. Spawn the relay dispatcher
//! 6. Serve HTTP and `WebSocket` until `Ctrl-C`

mod config;
mod error;

use std::sync::Arc;

use mural_grid::{GridDimensions, TileGrid};
use mural_pipeline::{DiskStore, ImagePipeline, StorageLayout};
use mural_relay::{AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig, MuralConfig};
use crate::error::AppError;

/// Application entry point for the relay.
///
/// # Errors
///
/// Returns an error if configuration, storage setup or the server fails.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration.
    let config = MuralConfig::load(|key| std::env::var(key).ok())?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        host = %config.server.host,
        port = config.server.port,
        public_root = %config.storage.public_root.display(),
        "mural-server starting"
    );

    // 3. Create the snapshot folders.
    let layout = StorageLayout::new(&config.storage.public_root);
    let pipeline = Arc::new(ImagePipeline::new(DiskStore::new(layout)));
    pipeline.prepare().await?;
    info!("Storage prepared");

    // 4. Rebuild the grid from the newest stored images.
    let dims = GridDimensions::new(config.grid.num_columns, config.grid.max_num_rows)?;
    let records = pipeline.bootstrap_records(dims.capacity()).await?;
    let grid = TileGrid::bootstrap(dims, records);
    info!(
        images = grid.len(),
        num_columns = dims.num_columns(),
        max_num_rows = dims.max_num_rows(),
        "Grid restored"
    );

    // 5. Spawn the relay dispatcher.
    let (events, _dispatcher) = mural_relay::spawn_relay(grid, pipeline);
    let state = Arc::new(AppState::new(events, &config.storage.public_root));

    // 6. Serve until shutdown.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    mural_relay::start_server(&server_config, state).await?;

    info!("mural-server stopped");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
