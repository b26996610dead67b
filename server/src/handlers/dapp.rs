//! HTTP wrappers around `DappClient`
//!
//! Failures are rendered in the `ApiResponse` envelope with the error's
//! message in place of the value.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::app_state::AppState;
use crate::chain::{Address, ContractError, FlightRegistered, InsurancePurchased, TxReceipt};
use crate::models::{AirlineRequest, AirlineStatus, ApiResponse, FlightRequest, InsuranceRequest};
use crate::services::dapp_service::FlightStatusRequest;
use crate::services::{DappClient, DappError};

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn status_for(err: &DappError) -> StatusCode {
    match err {
        DappError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        DappError::NotEnoughAccounts { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DappError::Contract(ContractError::Reverted { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        DappError::Contract(ContractError::ReceiptTimeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        DappError::Contract(_) => StatusCode::BAD_GATEWAY,
    }
}

fn reply<T>(result: Result<T, DappError>) -> Reply<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(err) => {
            tracing::warn!(error = %err, "dapp request failed");
            (status_for(&err), Json(ApiResponse::err(err.to_string())))
        }
    }
}

fn client<T>(state: &AppState) -> Result<Arc<DappClient>, Reply<T>> {
    state.dapp.clone().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::err("dapp client is not available on this node")),
        )
    })
}

fn invalid<T>(err: validator::ValidationErrors) -> Reply<T> {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::err(format!("Validation error: {err}"))),
    )
}

pub async fn get_operational_status(State(state): State<AppState>) -> Reply<bool> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    reply(dapp.is_operational().await)
}

pub async fn fetch_flight_status(
    State(state): State<AppState>,
    Json(request): Json<FlightRequest>,
) -> Reply<FlightStatusRequest> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    if let Err(err) = request.validate() {
        return invalid(err);
    }
    reply(dapp.fetch_flight_status(&request.flight).await)
}

pub async fn fund_airline(State(state): State<AppState>) -> Reply<TxReceipt> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    reply(dapp.fund_airline().await)
}

pub async fn register_airline(
    State(state): State<AppState>,
    Json(request): Json<AirlineRequest>,
) -> Reply<TxReceipt> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    reply(dapp.register_airline(request.airline).await)
}

pub async fn get_airline_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Reply<AirlineStatus> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    let airline: Address = match address.parse() {
        Ok(airline) => airline,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::err(format!("invalid airline address: {err}"))),
            )
        }
    };

    let status = async {
        Ok::<_, DappError>(AirlineStatus {
            airline,
            registered: dapp.is_airline(airline).await?,
            funded: dapp.is_airline_funded(airline).await?,
        })
    };
    reply(status.await)
}

pub async fn register_flight(
    State(state): State<AppState>,
    Json(request): Json<FlightRequest>,
) -> Reply<FlightRegistered> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    if let Err(err) = request.validate() {
        return invalid(err);
    }
    reply(dapp.register_flight(&request.flight).await)
}

pub async fn buy_insurance(
    State(state): State<AppState>,
    Json(request): Json<InsuranceRequest>,
) -> Reply<InsurancePurchased> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    if let Err(err) = request.validate() {
        return invalid(err);
    }
    reply(dapp.buy_insurance(request.flight_key, &request.amount).await)
}

pub async fn pay_passenger(State(state): State<AppState>) -> Reply<TxReceipt> {
    let dapp = match client(&state) {
        Ok(dapp) => dapp,
        Err(reply) => return reply,
    };
    reply(dapp.pay_passenger().await)
}
