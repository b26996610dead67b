//! Business logic services for the FlightSurety server

pub mod dapp_service;
pub mod event_monitoring_service;
pub mod oracle_registration;
pub mod oracle_service;

pub use dapp_service::{DappClient, DappError};
pub use oracle_registration::AccountRoster;
pub use oracle_service::{CoordinatorStats, OracleCoordinator};
