//! Ethereum JSON-RPC over HTTP

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::debug;

use super::types::{Address, Bytes, Log, TxReceipt, B256, U256, U64};
use super::ContractError;

/// How long to wait for a sent transaction to be mined
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolling {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            attempts: 120,
        }
    }
}

/// Read-only `eth_call`
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// `eth_sendTransaction` for an account the node holds keys for
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
    pub gas: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<B256>,
    pub from_block: u64,
    pub to_block: u64,
}

impl CallRequest {
    fn to_json(&self) -> Value {
        let mut call = json!({
            "to": self.to,
            "data": self.data,
        });
        if let Some(from) = self.from {
            call["from"] = json!(from);
        }
        call
    }
}

impl TransactionRequest {
    fn to_json(&self) -> Value {
        let mut tx = json!({
            "from": self.from,
            "to": self.to,
            "data": self.data,
        });
        if let Some(value) = self.value {
            tx["value"] = json!(value);
        }
        if let Some(gas) = self.gas {
            tx["gas"] = json!(U64::from(gas));
        }
        tx
    }
}

impl LogFilter {
    fn to_json(&self) -> Value {
        json!({
            "address": self.address,
            "topics": [self.topics],
            "fromBlock": U64::from(self.from_block),
            "toBlock": U64::from(self.to_block),
        })
    }
}

pub struct RpcClient {
    url: String,
    http: Client,
    next_id: AtomicU64,
    receipts: ReceiptPolling,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, receipts: ReceiptPolling) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
            next_id: AtomicU64::new(1),
            receipts,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ContractError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        if let Some(err) = response.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(-1);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(ContractError::from_rpc(code, message));
        }

        let result = response
            .get("result")
            .cloned()
            .ok_or_else(|| ContractError::Decode(format!("{method}: no result in RPC response")))?;
        serde_json::from_value(result)
            .map_err(|err| ContractError::Decode(format!("{method}: {err}")))
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, ContractError> {
        self.request("eth_accounts", json!([])).await
    }

    pub async fn block_number(&self) -> Result<u64, ContractError> {
        let number: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(number.to::<u64>())
    }

    pub async fn call(&self, call: &CallRequest) -> Result<Bytes, ContractError> {
        self.request("eth_call", json!([call.to_json(), "latest"]))
            .await
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ContractError> {
        self.request("eth_sendTransaction", json!([tx.to_json()])).await
    }

    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TxReceipt>, ContractError> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }

    /// Poll until the transaction is mined. A receipt with a failure status
    /// is reported as a revert.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, ContractError> {
        for attempt in 0..self.receipts.attempts {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                if !receipt.succeeded() {
                    return Err(ContractError::Reverted {
                        reason: format!("transaction {hash} failed on-chain"),
                    });
                }
                return Ok(receipt);
            }
            debug!(tx = %hash, attempt, "receipt not available yet");
            sleep(self.receipts.interval).await;
        }
        Err(ContractError::ReceiptTimeout(hash))
    }

    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ContractError> {
        self.request("eth_getLogs", json!([filter.to_json()])).await
    }
}
