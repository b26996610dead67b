//! Dapp client: one method per passenger or airline action
//!
//! Roles are assigned from the node's account list the way the FlightSurety
//! UI does it: the first account owns the contracts, the next five act as
//! airlines and the five after that as passengers. Every call is a single
//! attempt; contract errors are returned unchanged.

use std::sync::Arc;

use alloy_primitives::utils::parse_ether;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::chain::{
    Address, ContractError, ContractEvent, FlightRegistered, FlightSuretyContract,
    InsurancePurchased, TxReceipt, B256, U256,
};

const AIRLINE_COUNT: usize = 5;
const PASSENGER_COUNT: usize = 5;
const REQUIRED_ACCOUNTS: usize = 1 + AIRLINE_COUNT + PASSENGER_COUNT;

const WEI_PER_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
const AIRLINE_FUNDING_ETHER: u64 = 10;
const REGISTER_FLIGHT_GAS: u64 = 700_000;
const BUY_INSURANCE_GAS: u64 = 300_000;

#[derive(Debug, Error)]
pub enum DappError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("need at least {needed} accounts, the node exposes {available}")]
    NotEnoughAccounts { needed: usize, available: usize },

    #[error("invalid ether amount {0:?}")]
    InvalidAmount(String),
}

/// The flight-status request that was broadcast to the oracles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightStatusRequest {
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
    pub tx_hash: B256,
}

/// Decimal ether string to wei. Empty and negative amounts are rejected;
/// `parse_ether` would read a negative amount as its magnitude.
fn premium_wei(amount: &str) -> Result<U256, DappError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(DappError::InvalidAmount(amount.to_string()));
    }
    parse_ether(trimmed).map_err(|_| DappError::InvalidAmount(amount.to_string()))
}

pub struct DappClient {
    contract: Arc<dyn FlightSuretyContract>,
    owner: Address,
    airlines: Vec<Address>,
    passengers: Vec<Address>,
    timestamp: u64,
}

impl DappClient {
    /// Enumerate node accounts and assign roles. Flights registered and
    /// queried through this client all use the same departure timestamp,
    /// taken here.
    pub async fn initialize(contract: Arc<dyn FlightSuretyContract>) -> Result<Self, DappError> {
        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        Self::with_timestamp(contract, timestamp).await
    }

    pub async fn with_timestamp(
        contract: Arc<dyn FlightSuretyContract>,
        timestamp: u64,
    ) -> Result<Self, DappError> {
        let accounts = contract.accounts().await?;
        if accounts.len() < REQUIRED_ACCOUNTS {
            return Err(DappError::NotEnoughAccounts {
                needed: REQUIRED_ACCOUNTS,
                available: accounts.len(),
            });
        }

        let owner = accounts[0];
        let airlines = accounts[1..=AIRLINE_COUNT].to_vec();
        let passengers = accounts[AIRLINE_COUNT + 1..REQUIRED_ACCOUNTS].to_vec();
        info!(%owner, airline = %airlines[0], passenger = %passengers[0], timestamp, "dapp client ready");

        Ok(Self {
            contract,
            owner,
            airlines,
            passengers,
            timestamp,
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn airlines(&self) -> &[Address] {
        &self.airlines
    }

    pub fn passengers(&self) -> &[Address] {
        &self.passengers
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn airline(&self) -> Address {
        self.airlines[0]
    }

    fn passenger(&self) -> Address {
        self.passengers[0]
    }

    pub async fn is_operational(&self) -> Result<bool, DappError> {
        Ok(self.contract.is_operational(self.owner).await?)
    }

    /// Ask the contract to emit an `OracleRequest` for `flight`.
    pub async fn fetch_flight_status(&self, flight: &str) -> Result<FlightStatusRequest, DappError> {
        let receipt = self
            .contract
            .fetch_flight_status(self.owner, self.airline(), flight, self.timestamp)
            .await?;

        Ok(FlightStatusRequest {
            airline: self.airline(),
            flight: flight.to_string(),
            timestamp: self.timestamp,
            tx_hash: receipt.transaction_hash,
        })
    }

    pub async fn fund_airline(&self) -> Result<TxReceipt, DappError> {
        Ok(self
            .contract
            .fund_airline(self.airline(), U256::from(AIRLINE_FUNDING_ETHER) * WEI_PER_ETHER)
            .await?)
    }

    pub async fn register_flight(&self, flight: &str) -> Result<FlightRegistered, DappError> {
        let receipt = self
            .contract
            .register_flight(self.airline(), flight, self.timestamp, REGISTER_FLIGHT_GAS)
            .await?;
        Ok(FlightRegistered::find_in(&receipt)?)
    }

    /// Insure the first passenger on `flight_key` for `amount` ether.
    pub async fn buy_insurance(
        &self,
        flight_key: B256,
        amount: &str,
    ) -> Result<InsurancePurchased, DappError> {
        let value = premium_wei(amount)?;
        let receipt = self
            .contract
            .buy_insurance(self.passenger(), flight_key, value, BUY_INSURANCE_GAS)
            .await?;
        Ok(InsurancePurchased::find_in(&receipt)?)
    }

    /// Withdraw the first passenger's credited payout.
    pub async fn pay_passenger(&self) -> Result<TxReceipt, DappError> {
        Ok(self.contract.pay_passenger(self.passenger()).await?)
    }

    /// Vote, as the first airline, to admit `airline`.
    pub async fn register_airline(&self, airline: Address) -> Result<TxReceipt, DappError> {
        Ok(self.contract.register_airline(self.airline(), airline).await?)
    }

    pub async fn is_airline(&self, airline: Address) -> Result<bool, DappError> {
        Ok(self.contract.is_airline(self.owner, airline).await?)
    }

    pub async fn is_airline_funded(&self, airline: Address) -> Result<bool, DappError> {
        Ok(self.contract.is_airline_funded(self.owner, airline).await?)
    }
}
