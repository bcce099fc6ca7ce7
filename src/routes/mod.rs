use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod tables;

const SERVICE_NAME: &str = "CSV Analysis Service";
const DESCRIPTION: &str = "CSV data analysis and cleaning";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    message: String,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    message: String,
    version: &'static str,
    description: &'static str,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

/// The full application: health, CSV endpoints, body limit and tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .merge(routes())
        .merge(tables::routes())
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: format!("{} is running", SERVICE_NAME),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("Welcome to {}", SERVICE_NAME),
        version: env!("CARGO_PKG_VERSION"),
        description: DESCRIPTION,
    })
}
