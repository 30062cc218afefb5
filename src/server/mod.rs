//! HTTP front end.
//!
//! Every request runs on its own task; device polls move onto the blocking
//! pool while they wait, so one device's long-poll never holds up another.

mod config;
mod error;
mod routes;

use std::io;

use tokio::net::TcpListener;
use tracing::info;

pub use config::{ConfigError, DEFAULT_PORT, ServerConfig};
pub use error::ApiError;
pub use routes::{
    CLIENT_ID_PARAM, ControlQuery, DEVICE_PATH, DeviceQuery, MAX_MOCK_SIZE, router,
};

use crate::delivery::{DeliveryError, DeliveryService};

/// Errors that stop the server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Service could not be built.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    /// Socket failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let service = DeliveryService::shared(config.delivery)?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        poll_timeout_secs = config.delivery.poll_timeout.as_secs(),
        max_block_bytes = config.delivery.max_block_bytes,
        "board bot server listening"
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("ctrl-c received, shutting down");
    }
}
