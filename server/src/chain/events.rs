//! Typed FlightSurety contract events
//!
//! Each event is decoded with its `sol!` binding and then narrowed into a
//! domain struct (timestamps as `u64`).

use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};

use super::abi;
use super::types::{Address, Log, TxReceipt, B256, U256};
use super::ContractError;

pub trait ContractEvent: Sized {
    type Abi: SolEvent;

    const NAME: &'static str;

    fn from_abi(event: Self::Abi) -> Result<Self, ContractError>;

    fn to_abi(&self) -> Self::Abi;

    fn topic() -> B256 {
        Self::Abi::SIGNATURE_HASH
    }

    fn matches(log: &Log) -> bool {
        log.topics.first() == Some(&Self::topic())
    }

    /// Malformed log data comes back as `ContractError::Decode`.
    fn decode_log(log: &Log) -> Result<Self, ContractError> {
        let event = Self::Abi::decode_raw_log(log.topics.iter().copied(), &log.data, true)
            .map_err(|err| ContractError::Decode(format!("{} log: {err}", Self::NAME)))?;
        Self::from_abi(event)
    }

    /// First occurrence of this event in a receipt
    fn find_in(receipt: &TxReceipt) -> Result<Self, ContractError> {
        let log = receipt
            .logs
            .iter()
            .find(|log| Self::matches(log))
            .ok_or(ContractError::MissingEvent(Self::NAME))?;
        Self::decode_log(log)
    }

    /// Log entry carrying this event, as the contract would emit it
    fn to_log(&self, address: Address) -> Log {
        let encoded = self.to_abi().encode_log_data();
        Log {
            address,
            topics: encoded.topics().to_vec(),
            data: encoded.data,
            block_number: None,
            transaction_hash: None,
        }
    }
}

fn timestamp(event: &'static str, value: U256) -> Result<u64, ContractError> {
    u64::try_from(value)
        .map_err(|_| ContractError::Decode(format!("{event} timestamp {value} exceeds u64")))
}

/// Flight-status lookup broadcast to oracles holding `index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub index: u8,
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
}

impl ContractEvent for OracleRequest {
    type Abi = abi::OracleRequest;

    const NAME: &'static str = "OracleRequest";

    fn from_abi(event: Self::Abi) -> Result<Self, ContractError> {
        Ok(Self {
            index: event.index,
            airline: event.airline,
            flight: event.flight,
            timestamp: timestamp(Self::NAME, event.timestamp)?,
        })
    }

    fn to_abi(&self) -> Self::Abi {
        abi::OracleRequest {
            index: self.index,
            airline: self.airline,
            flight: self.flight.clone(),
            timestamp: U256::from(self.timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRegistered {
    pub airline: Address,
    pub flight: String,
    pub flight_key: B256,
    pub timestamp: u64,
}

impl ContractEvent for FlightRegistered {
    type Abi = abi::FlightRegistered;

    const NAME: &'static str = "FlightRegistered";

    fn from_abi(event: Self::Abi) -> Result<Self, ContractError> {
        Ok(Self {
            airline: event.airline,
            flight: event.flight,
            flight_key: event.flightKey,
            timestamp: timestamp(Self::NAME, event.timestamp)?,
        })
    }

    fn to_abi(&self) -> Self::Abi {
        abi::FlightRegistered {
            airline: self.airline,
            flight: self.flight.clone(),
            flightKey: self.flight_key,
            timestamp: U256::from(self.timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePurchased {
    pub passenger: Address,
    pub flight_key: B256,
    /// Premium in wei
    pub amount: U256,
}

impl ContractEvent for InsurancePurchased {
    type Abi = abi::InsurancePurchased;

    const NAME: &'static str = "InsurancePurchased";

    fn from_abi(event: Self::Abi) -> Result<Self, ContractError> {
        Ok(Self {
            passenger: event.passenger,
            flight_key: event.flightKey,
            amount: event.amount,
        })
    }

    fn to_abi(&self) -> Self::Abi {
        abi::InsurancePurchased {
            passenger: self.passenger,
            flightKey: self.flight_key,
            amount: self.amount,
        }
    }
}
