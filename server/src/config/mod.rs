//! Server configuration from the environment and the network map file

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::chain::rpc::ReceiptPolling;

pub mod contracts;

pub use contracts::NetworkConfig;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_NETWORK: &str = "localhost";
const DEFAULT_MAX_IN_FLIGHT: usize = 16;
const DEFAULT_REGISTRATION_GAS: u64 = 300_000;
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 2;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid network config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("network {0:?} is not defined in the config file")]
    UnknownNetwork(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// How `OracleRequest` events reach the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTransport {
    WebSocket,
    Polling,
}

impl FromStr for EventTransport {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ws" | "websocket" => Ok(EventTransport::WebSocket),
            "poll" | "polling" | "http" => Ok(EventTransport::Polling),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub max_in_flight: usize,
    pub registration_gas: u64,
    pub transport: EventTransport,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub network_name: String,
    pub network: NetworkConfig,
    pub oracle: OracleSettings,
    pub receipts: ReceiptPolling,
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_path = PathBuf::from(
            env::var("FLIGHTSURETY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string()),
        );
        let network_name =
            env::var("FLIGHTSURETY_NETWORK").unwrap_or_else(|_| DEFAULT_NETWORK.to_string());
        let network = contracts::load_network(&config_path, &network_name)?;

        let receipts = ReceiptPolling {
            attempts: env_or("RECEIPT_POLL_ATTEMPTS", ReceiptPolling::default().attempts)?,
            ..ReceiptPolling::default()
        };

        let oracle = OracleSettings {
            max_in_flight: env_or("ORACLE_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT)?.max(1),
            registration_gas: env_or("ORACLE_REGISTRATION_GAS", DEFAULT_REGISTRATION_GAS)?,
            transport: env_or("ORACLE_EVENT_TRANSPORT", EventTransport::WebSocket)?,
            poll_interval: Duration::from_secs(env_or(
                "EVENT_POLL_INTERVAL_SECONDS",
                DEFAULT_POLL_INTERVAL_SECONDS,
            )?),
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            port: env_or("PORT", DEFAULT_PORT)?,
            network_name,
            network,
            oracle,
            receipts,
            cors_allowed_origins,
        })
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}
