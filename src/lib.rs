//! plant_id_relay: accepts a plant photo, asks Pl@ntNet what it is, and answers in a fixed
//! JSON shape. Upstream failures are answered with sample data rather than errors.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod model;
pub mod plantnet;
pub mod routes;
pub mod upload;

use config::Config;
use plantnet::PlantNetClient;
use upload::MAX_UPLOAD_BYTES;

/// Headroom over the upload ceiling for multipart boundaries and headers.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub struct AppState {
    /// Sole source of the PlantNet credential.
    pub config: Config,
    pub client: PlantNetClient,
}

impl AppState {
    pub fn new(config: Config, client: PlantNetClient) -> Self {
        Self { config, client }
    }

    pub fn from_config(config: Config) -> Result<Self, error::UpstreamError> {
        let client = PlantNetClient::new()?;
        Ok(Self::new(config, client))
    }
}

pub fn build_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/identify", post(routes::identify))
        .route("/health", get(routes::health))
        .route("/test-api", get(routes::test_api))
        .route("/test-plantnet", get(routes::test_plantnet))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES))
        .with_state(shared_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
