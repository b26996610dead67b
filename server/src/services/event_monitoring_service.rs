//! Sources of `OracleRequest` events
//!
//! Both listeners decode contract logs and forward them to the coordinator
//! over an mpsc channel. `WsSubscription` follows the node's `eth_subscribe`
//! push feed; `LogPoller` walks `eth_getLogs` block ranges for nodes without
//! a WebSocket endpoint.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::chain::rpc::LogFilter;
use crate::chain::{Address, ContractError, ContractEvent, Log, OracleRequest, RpcClient};

/// Upper bound on blocks covered by one `eth_getLogs` call
const MAX_BLOCK_RANGE: u64 = 200;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("subscription rejected: {0}")]
    Subscription(String),

    #[error("event stream closed by the node")]
    StreamClosed,

    #[error("oracle coordinator is no longer accepting requests")]
    CoordinatorGone,
}

impl From<tokio_tungstenite::tungstenite::Error> for ListenerError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ListenerError::Contract(err.into())
    }
}

/// Decode a log and hand it to the coordinator. Logs that are not well-formed
/// `OracleRequest`s are dropped.
async fn forward(log: &Log, sender: &mpsc::Sender<OracleRequest>) -> Result<(), ListenerError> {
    match OracleRequest::decode_log(log) {
        Ok(request) => sender
            .send(request)
            .await
            .map_err(|_| ListenerError::CoordinatorGone),
        Err(err) => {
            warn!(error = %err, tx = ?log.transaction_hash, "skipping undecodable log");
            Ok(())
        }
    }
}

pub enum RequestListener {
    WebSocket(WsSubscription),
    Polling(LogPoller),
}

impl RequestListener {
    pub async fn start(self) -> Result<(), ListenerError> {
        match self {
            RequestListener::WebSocket(subscription) => subscription.start().await,
            RequestListener::Polling(poller) => poller.start().await,
        }
    }
}

pub struct WsSubscription {
    url: String,
    contract: Address,
    sender: mpsc::Sender<OracleRequest>,
}

/// A text frame received on the subscription socket
#[derive(Debug, PartialEq)]
enum Frame {
    Subscribed(String),
    Log(Box<Log>),
    Rejected(String),
    Malformed(String),
    Ignored,
}

fn parse_frame(text: &str) -> Frame {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => return Frame::Malformed(err.to_string()),
    };

    if let Some(err) = value.get("error") {
        return Frame::Rejected(err.to_string());
    }

    if value.get("method").and_then(Value::as_str) == Some("eth_subscription") {
        return match value.pointer("/params/result").cloned().map(serde_json::from_value::<Log>) {
            Some(Ok(log)) => Frame::Log(Box::new(log)),
            Some(Err(err)) => Frame::Malformed(err.to_string()),
            None => Frame::Ignored,
        };
    }

    match value.get("result").and_then(Value::as_str) {
        Some(id) => Frame::Subscribed(id.to_string()),
        None => Frame::Ignored,
    }
}

impl WsSubscription {
    pub fn new(url: String, contract: Address, sender: mpsc::Sender<OracleRequest>) -> Self {
        Self {
            url,
            contract,
            sender,
        }
    }

    pub async fn start(self) -> Result<(), ListenerError> {
        let (mut socket, _) = connect_async(self.url.as_str()).await?;

        let subscribe = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["logs", {
                "address": self.contract,
                "topics": [OracleRequest::topic()],
            }],
        });
        socket.send(Message::Text(subscribe.to_string())).await?;
        info!(url = %self.url, contract = %self.contract, "subscribing to OracleRequest events");

        while let Some(message) = socket.next().await {
            match message? {
                Message::Text(text) => match parse_frame(&text) {
                    Frame::Subscribed(id) => info!(subscription = %id, "OracleRequest subscription active"),
                    Frame::Log(log) => forward(&log, &self.sender).await?,
                    Frame::Rejected(err) => return Err(ListenerError::Subscription(err)),
                    Frame::Malformed(err) => warn!(error = %err, "ignoring malformed frame"),
                    Frame::Ignored => debug!(frame = %text, "ignoring frame"),
                },
                Message::Ping(payload) => socket.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Err(ListenerError::StreamClosed),
                _ => {}
            }
        }

        Err(ListenerError::StreamClosed)
    }
}

pub struct LogPoller {
    rpc: Arc<RpcClient>,
    contract: Address,
    interval: Duration,
    cursor: Arc<Mutex<Option<u64>>>,
    sender: mpsc::Sender<OracleRequest>,
}

impl LogPoller {
    /// `cursor` is the last block already scanned; `None` starts at the
    /// chain head so only new requests are answered.
    pub fn new(
        rpc: Arc<RpcClient>,
        contract: Address,
        interval: Duration,
        cursor: Arc<Mutex<Option<u64>>>,
        sender: mpsc::Sender<OracleRequest>,
    ) -> Self {
        Self {
            rpc,
            contract,
            interval,
            cursor,
            sender,
        }
    }

    pub async fn start(self) -> Result<(), ListenerError> {
        info!(contract = %self.contract, interval = ?self.interval, "polling for OracleRequest events");

        loop {
            match self.poll_once().await {
                Ok(matched) if matched > 0 => debug!(matched, "poll cycle complete"),
                Ok(_) => {}
                Err(ListenerError::CoordinatorGone) => return Err(ListenerError::CoordinatorGone),
                Err(err) => error!(error = %err, "OracleRequest poll cycle failed"),
            }

            sleep(self.interval).await;
        }
    }

    /// Scan the next block range and return how many matching logs it held.
    pub async fn poll_once(&self) -> Result<usize, ListenerError> {
        let latest = self.rpc.block_number().await?;

        let mut cursor = self.cursor.lock().await;
        let Some((from_block, to_block)) = next_range(*cursor, latest) else {
            if cursor.is_none() {
                *cursor = Some(latest);
            }
            return Ok(0);
        };

        let logs = self
            .rpc
            .get_logs(&LogFilter {
                address: self.contract,
                topics: vec![OracleRequest::topic()],
                from_block,
                to_block,
            })
            .await?;

        for log in &logs {
            forward(log, &self.sender).await?;
        }

        *cursor = Some(to_block);
        Ok(logs.len())
    }
}

/// Inclusive block range following `cursor`, capped at `MAX_BLOCK_RANGE`.
fn next_range(cursor: Option<u64>, latest: u64) -> Option<(u64, u64)> {
    let from_block = cursor?.saturating_add(1);
    if from_block > latest {
        return None;
    }
    Some((from_block, latest.min(from_block.saturating_add(MAX_BLOCK_RANGE - 1))))
}
