//! In-memory stand-ins for `FlightSuretyApp`

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use flightsurety_server::chain::{
    AccountSource, Address, ContractError, ContractEvent, FlightRegistered, FlightSuretyContract,
    InsurancePurchased, Log, OracleContract, TxReceipt, B256, U256,
};
use flightsurety_server::models::oracle::Submission;

pub mod node;

pub fn account(n: u8) -> Address {
    Address::repeat_byte(n)
}

pub fn receipt(tag: u8) -> TxReceipt {
    TxReceipt {
        transaction_hash: B256::repeat_byte(tag),
        block_number: Some(1),
        status: Some(1),
        logs: Vec::new(),
    }
}

fn reverted(reason: &str) -> ContractError {
    ContractError::Reverted {
        reason: reason.to_string(),
    }
}

/// Oracle side of the contract with per-account fault injection
#[derive(Default)]
pub struct FakeOracleContract {
    pub accounts: Vec<Address>,
    pub indexes: HashMap<Address, Vec<u8>>,
    pub fee: U256,
    pub failing_lookups: HashSet<Address>,
    pub failing_submissions: HashSet<Address>,
    pub failing_registrations: HashSet<Address>,
    pub latency: Option<Duration>,

    pub lookups: Mutex<Vec<Address>>,
    pub submissions: Mutex<Vec<Submission>>,
    pub registrations: Mutex<Vec<(Address, U256, u64)>>,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl FakeOracleContract {
    pub fn with_indexes(assignments: &[(Address, &[u8])]) -> Self {
        Self {
            accounts: assignments.iter().map(|(account, _)| *account).collect(),
            indexes: assignments
                .iter()
                .map(|(account, indexes)| (*account, indexes.to_vec()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<Address> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn rpc_round_trip(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountSource for FakeOracleContract {
    async fn accounts(&self) -> Result<Vec<Address>, ContractError> {
        Ok(self.accounts.clone())
    }
}

#[async_trait]
impl OracleContract for FakeOracleContract {
    async fn registration_fee(&self) -> Result<U256, ContractError> {
        Ok(self.fee)
    }

    async fn register_oracle(
        &self,
        from: Address,
        fee: U256,
        gas: u64,
    ) -> Result<TxReceipt, ContractError> {
        self.registrations.lock().unwrap().push((from, fee, gas));
        if self.failing_registrations.contains(&from) {
            return Err(reverted("Registration fee is required"));
        }
        Ok(receipt(from[0]))
    }

    async fn get_my_indexes(&self, from: Address) -> Result<Vec<u8>, ContractError> {
        self.lookups.lock().unwrap().push(from);
        self.rpc_round_trip().await;
        if self.failing_lookups.contains(&from) {
            return Err(ContractError::Transport("connection reset by peer".to_string()));
        }
        self.indexes
            .get(&from)
            .cloned()
            .ok_or_else(|| reverted("Not registered as an oracle"))
    }

    async fn submit_oracle_response(
        &self,
        submission: &Submission,
    ) -> Result<TxReceipt, ContractError> {
        self.submissions.lock().unwrap().push(submission.clone());
        self.rpc_round_trip().await;
        if self.failing_submissions.contains(&submission.oracle) {
            return Err(reverted("Index does not match oracle request"));
        }
        Ok(receipt(submission.index))
    }
}

/// Passenger/airline side of the contract recording each call
pub struct FakeFlightSurety {
    pub accounts: Vec<Address>,
    pub app_address: Address,
    pub operational: bool,
    pub flight_key: B256,
    pub omit_events: bool,
    pub revert_all: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeFlightSurety {
    pub fn new(account_count: u8) -> Self {
        Self {
            accounts: (1..=account_count).map(account).collect(),
            app_address: Address::repeat_byte(0xf2),
            operational: true,
            flight_key: B256::repeat_byte(0x6b),
            omit_events: false,
            revert_all: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ContractError> {
        self.calls.lock().unwrap().push(call);
        if self.revert_all {
            return Err(reverted("Contract is currently not operational"));
        }
        Ok(())
    }

    fn receipt_with(&self, logs: Vec<Log>) -> TxReceipt {
        let mut receipt = receipt(0xee);
        if !self.omit_events {
            receipt.logs = logs;
        }
        receipt
    }
}

#[async_trait]
impl AccountSource for FakeFlightSurety {
    async fn accounts(&self) -> Result<Vec<Address>, ContractError> {
        Ok(self.accounts.clone())
    }
}

#[async_trait]
impl FlightSuretyContract for FakeFlightSurety {
    async fn is_operational(&self, from: Address) -> Result<bool, ContractError> {
        self.record(format!("isOperational from {from}"))?;
        Ok(self.operational)
    }

    async fn fetch_flight_status(
        &self,
        from: Address,
        airline: Address,
        flight: &str,
        timestamp: u64,
    ) -> Result<TxReceipt, ContractError> {
        self.record(format!("fetchFlightStatus({airline},{flight},{timestamp}) from {from}"))?;
        Ok(receipt(0xee))
    }

    async fn fund_airline(&self, from: Address, value: U256) -> Result<TxReceipt, ContractError> {
        self.record(format!("fundAirline value {value} from {from}"))?;
        Ok(receipt(0xee))
    }

    async fn register_flight(
        &self,
        from: Address,
        flight: &str,
        timestamp: u64,
        gas: u64,
    ) -> Result<TxReceipt, ContractError> {
        self.record(format!("registerFlights({flight},{timestamp}) gas {gas} from {from}"))?;
        let event = FlightRegistered {
            airline: from,
            flight: flight.to_string(),
            flight_key: self.flight_key,
            timestamp,
        };
        Ok(self.receipt_with(vec![event.to_log(self.app_address)]))
    }

    async fn buy_insurance(
        &self,
        from: Address,
        flight_key: B256,
        value: U256,
        gas: u64,
    ) -> Result<TxReceipt, ContractError> {
        self.record(format!("buyInsurance({flight_key}) value {value} gas {gas} from {from}"))?;
        let event = InsurancePurchased {
            passenger: from,
            flight_key,
            amount: value,
        };
        Ok(self.receipt_with(vec![event.to_log(self.app_address)]))
    }

    async fn pay_passenger(&self, from: Address) -> Result<TxReceipt, ContractError> {
        self.record(format!("payPassenger from {from}"))?;
        Ok(receipt(0xee))
    }

    async fn register_airline(
        &self,
        from: Address,
        airline: Address,
    ) -> Result<TxReceipt, ContractError> {
        self.record(format!("registerAirline({airline}) from {from}"))?;
        Ok(receipt(0xee))
    }

    async fn is_airline(&self, from: Address, airline: Address) -> Result<bool, ContractError> {
        self.record(format!("isAirline({airline}) from {from}"))?;
        Ok(self.accounts[1..=5].contains(&airline))
    }

    async fn is_airline_funded(
        &self,
        from: Address,
        airline: Address,
    ) -> Result<bool, ContractError> {
        self.record(format!("isAirlineFunded({airline}) from {from}"))?;
        Ok(airline == self.accounts[1])
    }
}
