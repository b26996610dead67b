//! API handlers for the FlightSurety server

use axum::Json;
use serde_json::{json, Value};

pub mod dapp;

pub async fn api_info() -> Json<Value> {
    Json(json!({
        "message": "An API for use with your Dapp!"
    }))
}

pub async fn health_check() -> &'static str {
    "OK"
}
