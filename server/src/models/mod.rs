//! Data models for the FlightSurety server

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::chain::{Address, B256};

pub mod oracle;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FlightRequest {
    #[validate(length(min = 1, max = 32))]
    pub flight: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InsuranceRequest {
    pub flight_key: B256,
    /// Premium in ether, e.g. `"0.5"`
    #[validate(length(min = 1))]
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct AirlineRequest {
    pub airline: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AirlineStatus {
    pub airline: Address,
    pub registered: bool,
    pub funded: bool,
}
