//! `FlightSuretyApp` contract proxy
//!
//! The oracle services and the dapp client depend on the capability traits
//! below rather than on the RPC-backed proxy, so tests can stand in a fake
//! contract.

use std::sync::Arc;

use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use super::abi;
use super::rpc::{CallRequest, RpcClient, TransactionRequest};
use super::types::{Address, TxReceipt, B256, U256};
use super::ContractError;
use crate::models::oracle::Submission;

#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Accounts the node signs for, in the node's order
    async fn accounts(&self) -> Result<Vec<Address>, ContractError>;
}

/// Oracle-facing surface of `FlightSuretyApp`
#[async_trait]
pub trait OracleContract: AccountSource {
    async fn registration_fee(&self) -> Result<U256, ContractError>;

    async fn register_oracle(
        &self,
        from: Address,
        fee: U256,
        gas: u64,
    ) -> Result<TxReceipt, ContractError>;

    async fn get_my_indexes(&self, from: Address) -> Result<Vec<u8>, ContractError>;

    async fn submit_oracle_response(
        &self,
        submission: &Submission,
    ) -> Result<TxReceipt, ContractError>;
}

/// Passenger and airline surface of `FlightSuretyApp`
#[async_trait]
pub trait FlightSuretyContract: AccountSource {
    async fn is_operational(&self, from: Address) -> Result<bool, ContractError>;

    async fn fetch_flight_status(
        &self,
        from: Address,
        airline: Address,
        flight: &str,
        timestamp: u64,
    ) -> Result<TxReceipt, ContractError>;

    async fn fund_airline(&self, from: Address, value: U256) -> Result<TxReceipt, ContractError>;

    async fn register_flight(
        &self,
        from: Address,
        flight: &str,
        timestamp: u64,
        gas: u64,
    ) -> Result<TxReceipt, ContractError>;

    async fn buy_insurance(
        &self,
        from: Address,
        flight_key: B256,
        value: U256,
        gas: u64,
    ) -> Result<TxReceipt, ContractError>;

    async fn pay_passenger(&self, from: Address) -> Result<TxReceipt, ContractError>;

    async fn register_airline(
        &self,
        from: Address,
        airline: Address,
    ) -> Result<TxReceipt, ContractError>;

    async fn is_airline(&self, from: Address, airline: Address) -> Result<bool, ContractError>;

    async fn is_airline_funded(
        &self,
        from: Address,
        airline: Address,
    ) -> Result<bool, ContractError>;
}

/// Value and gas attached to a state-changing call
#[derive(Debug, Clone, Copy, Default)]
struct SendOptions {
    value: Option<U256>,
    gas: Option<u64>,
}

pub struct FlightSuretyApp {
    rpc: Arc<RpcClient>,
    address: Address,
}

impl FlightSuretyApp {
    pub fn new(rpc: Arc<RpcClient>, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read<C>(&self, from: Option<Address>, call: C) -> Result<C::Return, ContractError>
    where
        C: SolCall + Send + Sync,
    {
        let raw = self
            .rpc
            .call(&CallRequest {
                from,
                to: self.address,
                data: call.abi_encode().into(),
            })
            .await?;
        C::abi_decode_returns(&raw, true)
            .map_err(|err| ContractError::Decode(format!("{}: {err}", C::SIGNATURE)))
    }

    async fn send<C>(
        &self,
        from: Address,
        call: C,
        options: SendOptions,
    ) -> Result<TxReceipt, ContractError>
    where
        C: SolCall + Send + Sync,
    {
        let hash = self
            .rpc
            .send_transaction(&TransactionRequest {
                from,
                to: self.address,
                data: call.abi_encode().into(),
                value: options.value,
                gas: options.gas,
            })
            .await?;
        debug!(%from, tx = %hash, method = C::SIGNATURE, "transaction sent");
        self.rpc.wait_for_receipt(hash).await
    }
}

#[async_trait]
impl AccountSource for FlightSuretyApp {
    async fn accounts(&self) -> Result<Vec<Address>, ContractError> {
        self.rpc.accounts().await
    }
}

#[async_trait]
impl OracleContract for FlightSuretyApp {
    async fn registration_fee(&self) -> Result<U256, ContractError> {
        Ok(self.read(None, abi::REGISTRATION_FEECall {}).await?.fee)
    }

    async fn register_oracle(
        &self,
        from: Address,
        fee: U256,
        gas: u64,
    ) -> Result<TxReceipt, ContractError> {
        self.send(
            from,
            abi::registerOracleCall {},
            SendOptions {
                value: Some(fee),
                gas: Some(gas),
            },
        )
        .await
    }

    async fn get_my_indexes(&self, from: Address) -> Result<Vec<u8>, ContractError> {
        let returned = self.read(Some(from), abi::getMyIndexesCall {}).await?;
        Ok(returned.indexes.to_vec())
    }

    async fn submit_oracle_response(
        &self,
        submission: &Submission,
    ) -> Result<TxReceipt, ContractError> {
        let call = abi::submitOracleResponseCall {
            index: submission.index,
            airline: submission.airline,
            flight: submission.flight.clone(),
            timestamp: U256::from(submission.timestamp),
            statusCode: submission.status.code(),
        };
        self.send(submission.oracle, call, SendOptions::default())
            .await
    }
}

#[async_trait]
impl FlightSuretyContract for FlightSuretyApp {
    async fn is_operational(&self, from: Address) -> Result<bool, ContractError> {
        Ok(self.read(Some(from), abi::isOperationalCall {}).await?.operational)
    }

    async fn fetch_flight_status(
        &self,
        from: Address,
        airline: Address,
        flight: &str,
        timestamp: u64,
    ) -> Result<TxReceipt, ContractError> {
        let call = abi::fetchFlightStatusCall {
            airline,
            flight: flight.to_string(),
            timestamp: U256::from(timestamp),
        };
        self.send(from, call, SendOptions::default()).await
    }

    async fn fund_airline(&self, from: Address, value: U256) -> Result<TxReceipt, ContractError> {
        self.send(
            from,
            abi::fundAirlineCall {},
            SendOptions {
                value: Some(value),
                gas: None,
            },
        )
        .await
    }

    async fn register_flight(
        &self,
        from: Address,
        flight: &str,
        timestamp: u64,
        gas: u64,
    ) -> Result<TxReceipt, ContractError> {
        let call = abi::registerFlightsCall {
            flight: flight.to_string(),
            timestamp: U256::from(timestamp),
        };
        self.send(
            from,
            call,
            SendOptions {
                value: None,
                gas: Some(gas),
            },
        )
        .await
    }

    async fn buy_insurance(
        &self,
        from: Address,
        flight_key: B256,
        value: U256,
        gas: u64,
    ) -> Result<TxReceipt, ContractError> {
        self.send(
            from,
            abi::buyInsuranceCall {
                flightKey: flight_key,
            },
            SendOptions {
                value: Some(value),
                gas: Some(gas),
            },
        )
        .await
    }

    async fn pay_passenger(&self, from: Address) -> Result<TxReceipt, ContractError> {
        self.send(from, abi::payPassengerCall {}, SendOptions::default())
            .await
    }

    async fn register_airline(
        &self,
        from: Address,
        airline: Address,
    ) -> Result<TxReceipt, ContractError> {
        self.send(
            from,
            abi::registerAirlineCall { airline },
            SendOptions::default(),
        )
        .await
    }

    async fn is_airline(&self, from: Address, airline: Address) -> Result<bool, ContractError> {
        Ok(self
            .read(Some(from), abi::isAirlineCall { airline })
            .await?
            .registered)
    }

    async fn is_airline_funded(
        &self,
        from: Address,
        airline: Address,
    ) -> Result<bool, ContractError> {
        Ok(self
            .read(Some(from), abi::isAirlineFundedCall { airline })
            .await?
            .funded)
    }
}
