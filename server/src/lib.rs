//! FlightSurety oracle server library
//!
//! Registers the node's accounts as flight-status oracles, answers
//! `OracleRequest` events with simulated verdicts and serves a small HTTP API
//! for the passenger/airline dapp.

pub mod app_state;
pub mod chain;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
