//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: record store, write pipeline and purchase order wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use franchiseops_infra::{AppConfig, StoreError};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let db = config.open_database().await?;
    let services = AppServices::new(db, config.invariant_mode);
    Ok(build_app_with(Arc::new(services)))
}

/// Build the router around already constructed services.
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
