//! Route definitions for the FlightSurety API

use axum::{routing::get, Router};

use crate::app_state::AppState;
use crate::handlers;

mod dapp;

pub use dapp::dapp_routes;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(handlers::api_info))
        .route("/health", get(handlers::health_check))
}

/// Full router without transport layers (CORS, tracing)
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(api_routes())
        .merge(dapp_routes())
        .with_state(state)
}
