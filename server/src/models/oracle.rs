use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chain::{Address, ContractError, OracleRequest, B256, U256};

/// Flight status codes understood by `FlightSuretyApp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlightStatus {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

/// Lookup table for simulated responses. Draws come from `1..=5`, so slot 0
/// (`Unknown`) is never reported.
const STATUS_TABLE: [FlightStatus; 6] = [
    FlightStatus::Unknown,
    FlightStatus::OnTime,
    FlightStatus::LateAirline,
    FlightStatus::LateWeather,
    FlightStatus::LateTechnical,
    FlightStatus::LateOther,
];

impl FlightStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        STATUS_TABLE.iter().copied().find(|status| status.code() == code)
    }

    /// Simulated oracle verdict
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        STATUS_TABLE[rng.gen_range(1..=5)]
    }
}

/// One oracle's answer to one request under one of its indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub oracle: Address,
    pub index: u8,
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
    pub status: FlightStatus,
}

impl Submission {
    pub fn answering(request: &OracleRequest, oracle: Address, index: u8, status: FlightStatus) -> Self {
        Self {
            oracle,
            index,
            airline: request.airline,
            flight: request.flight.clone(),
            timestamp: request.timestamp,
            status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub submission: Submission,
    pub result: Result<B256, ContractError>,
}

impl SubmissionOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct LookupFailure {
    pub oracle: Address,
    pub error: ContractError,
}

/// Everything one delivery of an `OracleRequest` produced
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub request: OracleRequest,
    pub outcomes: Vec<SubmissionOutcome>,
    pub lookup_failures: Vec<LookupFailure>,
    /// Per-account tasks that panicked instead of reporting
    pub aborted: usize,
}

impl RoundReport {
    pub fn new(request: OracleRequest) -> Self {
        Self {
            request,
            outcomes: Vec::new(),
            lookup_failures: Vec::new(),
            aborted: 0,
        }
    }

    pub fn submitted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed_submissions(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.is_ok()).count()
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationReport {
    pub fee: U256,
    pub registered: Vec<Address>,
    pub failed: Vec<(Address, ContractError)>,
}
