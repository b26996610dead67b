use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::ConfigError;
use crate::chain::Address;

/// One entry of the network map in `config.json`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub url: String,
    pub app_address: Address,
    #[serde(default)]
    pub ws_url: Option<String>,
}

impl NetworkConfig {
    /// Subscription endpoint; derived from the HTTP URL unless set explicitly
    pub fn websocket_url(&self) -> String {
        self.ws_url
            .clone()
            .unwrap_or_else(|| self.url.replacen("http", "ws", 1))
    }
}

/// Only the selected entry has to be a valid `NetworkConfig`; other
/// networks in the file are left unchecked.
pub fn parse_network(raw: &str, network: &str) -> Result<NetworkConfig, ConfigError> {
    let mut networks: HashMap<String, Value> = serde_json::from_str(raw)?;
    let entry = networks
        .remove(network)
        .ok_or_else(|| ConfigError::UnknownNetwork(network.to_string()))?;
    Ok(serde_json::from_value(entry)?)
}

pub fn load_network(path: &Path, network: &str) -> Result<NetworkConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_network(&raw, network)
}
