//! Shiftledger API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod shutdown;
mod state;

use std::future::Future;

use axum::Router;
use shiftledger_core::AppError;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = api_services::connect(&config).await?;
    api_services::run_migrations(&pool).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let (app_state, sync_dispatcher) = api_services::build_app_state(pool, &config)?;
    let app = api_router::build_router(app_state);

    let address = config.socket_address()?;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "shiftledger-api listening");

    serve_until(listener, app, shutdown::shutdown_signal(), sync_dispatcher).await
}

/// Serves until `shutdown` resolves, then waits for queued sync jobs.
async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    sync_dispatcher: JoinHandle<()>,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")));

    // The router held the last queue handle, so the dispatcher now drains and stops.
    if let Err(error) = sync_dispatcher.await {
        warn!(error = %error, "shift sync dispatcher ended abnormally");
    }

    served
}
