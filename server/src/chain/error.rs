use thiserror::Error;

use super::types::B256;

/// Failures talking to the node or interpreting what it returned
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    /// The request never completed (connection, HTTP status, WebSocket)
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The transaction reached the chain and the contract rejected it
    #[error("transaction reverted: {reason}")]
    Reverted { reason: String },

    #[error("decode error: {0}")]
    Decode(String),

    /// A receipt came back without the event the caller depends on
    #[error("receipt is missing the {0} event")]
    MissingEvent(&'static str),

    #[error("no receipt for transaction {0} after polling")]
    ReceiptTimeout(B256),
}

impl ContractError {
    /// Classify a JSON-RPC error object. Dev nodes report contract rejections
    /// through the error message rather than a dedicated code.
    pub fn from_rpc(code: i64, message: String) -> Self {
        if message.to_ascii_lowercase().contains("revert") {
            ContractError::Reverted { reason: message }
        } else {
            ContractError::Rpc { code, message }
        }
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, ContractError::Reverted { .. })
    }
}

impl From<reqwest::Error> for ContractError {
    fn from(err: reqwest::Error) -> Self {
        ContractError::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ContractError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ContractError::Transport(err.to_string())
    }
}
