//! Route definitions for the oracle coordination API

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::handlers::*;

// Dapp-facing routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(api_root))
        .route("/api/flight-status/:code", get(set_flight_status))
}

// Operator routes
pub fn oracle_routes() -> Router<AppState> {
    Router::new().route("/api/oracles", get(list_oracles))
}

/// Full application router. An empty origin list allows any origin.
pub fn build_router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes())
        .merge(oracle_routes())
        .layer(build_cors_layer(cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    layer.allow_origin(origins)
}
