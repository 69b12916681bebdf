/*!
 * HTTP surface for the query service
 *
 * Read-only JSON endpoints on axum. The dataset is loaded before the
 * listener is bound and shared with every handler through `AppState`.
 */

pub mod error;
pub mod handlers;
pub mod router;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::dataset::PatientDataset;
use crate::service::PatientService;
use crate::Result;

pub use error::ApiError;
pub use router::build_router;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: PatientService,
}

impl AppState {
    pub fn new(dataset: Arc<PatientDataset>) -> Self {
        Self {
            service: PatientService::new(dataset),
        }
    }
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &ServiceConfig, dataset: Arc<PatientDataset>) -> Result<()> {
    let app = build_router(AppState::new(dataset), config.request_timeout());

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "stroke query server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("stroke query server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
