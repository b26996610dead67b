use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::dapp::*;

pub fn dapp_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dapp/operational", get(get_operational_status))
        .route("/api/dapp/flights", post(register_flight))
        .route("/api/dapp/flights/status", post(fetch_flight_status))
        .route("/api/dapp/airlines", post(register_airline))
        .route("/api/dapp/airlines/fund", post(fund_airline))
        .route("/api/dapp/airlines/:address", get(get_airline_status))
        .route("/api/dapp/insurance", post(buy_insurance))
        .route("/api/dapp/payouts", post(pay_passenger))
}
