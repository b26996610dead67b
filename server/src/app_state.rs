//! Application state shared across handlers

use std::sync::Arc;

use crate::services::DappClient;

/// Shared application state
#[derive(Clone, Default)]
pub struct AppState {
    /// Absent when the node exposes too few accounts for the dapp roles
    pub dapp: Option<Arc<DappClient>>,
}

impl AppState {
    pub fn new(dapp: Option<Arc<DappClient>>) -> Self {
        Self { dapp }
    }
}
