//! Ethereum plumbing for the FlightSurety contracts
//!
//! JSON-RPC transport, `sol!` bindings for `FlightSuretyApp` and the typed
//! proxy the oracle services and the dapp client talk to.

pub mod abi;
pub mod contract;
mod error;
pub mod events;
pub mod rpc;
pub mod types;

pub use contract::{AccountSource, FlightSuretyApp, FlightSuretyContract, OracleContract};
pub use error::ContractError;
pub use events::{ContractEvent, FlightRegistered, InsurancePurchased, OracleRequest};
pub use rpc::RpcClient;
pub use types::{Address, Bytes, Log, TxReceipt, B256, U256};
