//! Scripted JSON-RPC node served by axum on a loopback port

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy_primitives::{hex, U64};
use alloy_sol_types::SolCall;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

use flightsurety_server::chain::abi;
use flightsurety_server::chain::rpc::ReceiptPolling;
use flightsurety_server::chain::{Address, FlightSuretyApp, Log, RpcClient, U256};

pub const ONE_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
pub const APP_ADDRESS: Address = Address::new([0xf2; 20]);

#[derive(Default)]
pub struct NodeState {
    pub head: u64,
    pub logs: Vec<Log>,
    pub failed_status: bool,
    pub sent: Vec<Value>,
    pub log_queries: Vec<(u64, u64)>,
}

#[derive(Clone, Default)]
pub struct StubNode {
    state: Arc<Mutex<NodeState>>,
}

fn words(values: &[U256]) -> Value {
    let mut data = Vec::with_capacity(values.len() * 32);
    for value in values {
        data.extend_from_slice(&value.to_be_bytes::<32>());
    }
    json!(hex::encode_prefixed(data))
}

fn calls(data: &str, selector: [u8; 4]) -> bool {
    data.starts_with(&hex::encode_prefixed(selector))
}

fn block(value: &Value) -> u64 {
    serde_json::from_value::<U64>(value.clone())
        .map(|number| number.to::<u64>())
        .unwrap_or_default()
}

impl StubNode {
    pub fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap()
    }

    /// Serve the node and return its HTTP URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let router = Router::new().route("/", post(handle)).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        url
    }

    pub async fn rpc(&self) -> Arc<RpcClient> {
        let polling = ReceiptPolling {
            interval: Duration::from_millis(10),
            attempts: 3,
        };
        Arc::new(RpcClient::new(self.spawn().await, polling))
    }

    pub async fn app(&self) -> FlightSuretyApp {
        FlightSuretyApp::new(self.rpc().await, APP_ADDRESS)
    }

    fn respond(&self, method: &str, params: &Value) -> Result<Value, (i64, &'static str)> {
        let mut state = self.state();
        match method {
            "eth_accounts" => Ok(json!([Address::repeat_byte(1), Address::repeat_byte(2)])),
            "eth_blockNumber" => Ok(json!(U64::from(state.head))),
            "eth_getLogs" => {
                let from = block(&params[0]["fromBlock"]);
                let to = block(&params[0]["toBlock"]);
                state.log_queries.push((from, to));
                let logs: Vec<&Log> = state
                    .logs
                    .iter()
                    .filter(|log| log.block_number.is_some_and(|n| (from..=to).contains(&n)))
                    .collect();
                Ok(json!(logs))
            }
            "eth_call" => {
                let data = params[0]["data"].as_str().unwrap_or_default();
                if calls(data, abi::REGISTRATION_FEECall::SELECTOR) {
                    Ok(words(&[ONE_ETHER]))
                } else if calls(data, abi::getMyIndexesCall::SELECTOR) {
                    Ok(words(&[U256::from(3), U256::from(7), U256::from(9)]))
                } else if calls(data, abi::isOperationalCall::SELECTOR) {
                    Err((-32000, "execution reverted: Contract is currently not operational"))
                } else {
                    Err((-32601, "unexpected call"))
                }
            }
            "eth_sendTransaction" => {
                state.sent.push(params[0].clone());
                Ok(json!(format!("0x{}", "ab".repeat(32))))
            }
            "eth_getTransactionReceipt" => {
                let status = if state.failed_status { "0x0" } else { "0x1" };
                Ok(json!({
                    "transactionHash": params[0],
                    "blockNumber": "0x5",
                    "status": status,
                    "logs": [],
                }))
            }
            _ => Err((-32601, "method not found")),
        }
    }
}

async fn handle(State(node): State<StubNode>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();

    Json(match node.respond(method, &request["params"]) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }),
    })
}
