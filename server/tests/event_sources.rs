//! `OracleRequest` listeners against a scripted node

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;

use common::node::{StubNode, APP_ADDRESS};
use flightsurety_server::chain::rpc::ReceiptPolling;
use flightsurety_server::chain::{Address, Bytes, ContractEvent, Log, OracleRequest, RpcClient};
use flightsurety_server::services::event_monitoring_service::{
    ListenerError, LogPoller, WsSubscription,
};

fn request(flight: &str) -> OracleRequest {
    OracleRequest {
        index: 5,
        airline: Address::repeat_byte(0x21),
        flight: flight.to_string(),
        timestamp: 1_654_041_600,
    }
}

fn log_at(request: &OracleRequest, block: u64) -> Log {
    let mut log = request.to_log(APP_ADDRESS);
    log.block_number = Some(block);
    log
}

async fn poller_for(
    node: &StubNode,
    cursor: Option<u64>,
) -> (LogPoller, Arc<Mutex<Option<u64>>>, mpsc::Receiver<OracleRequest>) {
    let cursor = Arc::new(Mutex::new(cursor));
    let (sender, receiver) = mpsc::channel(16);
    let poller = LogPoller::new(
        node.rpc().await,
        APP_ADDRESS,
        Duration::from_millis(10),
        cursor.clone(),
        sender,
    );
    (poller, cursor, receiver)
}

#[tokio::test]
async fn first_poll_starts_at_the_chain_head() {
    let node = StubNode::default();
    {
        let mut state = node.state();
        state.head = 42;
        state.logs.push(log_at(&request("ND1309"), 40));
    }
    let (poller, cursor, mut receiver) = poller_for(&node, None).await;

    assert_eq!(poller.poll_once().await.unwrap(), 0);

    assert_eq!(*cursor.lock().await, Some(42));
    assert!(node.state().log_queries.is_empty());
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn forwards_new_requests_then_advances() {
    let node = StubNode::default();
    {
        let mut state = node.state();
        state.head = 12;
        state.logs.push(log_at(&request("OLD001"), 10));
        state.logs.push(log_at(&request("ND1309"), 11));
        state.logs.push(log_at(&request("KL0123"), 12));
    }
    let (poller, cursor, mut receiver) = poller_for(&node, Some(10)).await;

    assert_eq!(poller.poll_once().await.unwrap(), 2);

    assert_eq!(node.state().log_queries, vec![(11, 12)]);
    assert_eq!(*cursor.lock().await, Some(12));
    assert_eq!(receiver.recv().await.unwrap().flight, "ND1309");
    assert_eq!(receiver.recv().await.unwrap().flight, "KL0123");

    // nothing new until the head moves
    assert_eq!(poller.poll_once().await.unwrap(), 0);
    assert_eq!(node.state().log_queries.len(), 1);
}

#[tokio::test]
async fn long_gaps_are_scanned_two_hundred_blocks_at_a_time() {
    let node = StubNode::default();
    node.state().head = 1_000;
    let (poller, cursor, _receiver) = poller_for(&node, Some(0)).await;

    poller.poll_once().await.unwrap();
    assert_eq!(*cursor.lock().await, Some(200));

    poller.poll_once().await.unwrap();
    assert_eq!(*cursor.lock().await, Some(400));
    assert_eq!(node.state().log_queries, vec![(1, 200), (201, 400)]);
}

#[tokio::test]
async fn undecodable_logs_do_not_hold_back_the_cursor() {
    let node = StubNode::default();
    let mut garbage = log_at(&request("ND1309"), 6);
    garbage.data = Bytes::copy_from_slice(&garbage.data[..31]);
    {
        let mut state = node.state();
        state.head = 7;
        state.logs.push(garbage);
        state.logs.push(log_at(&request("KL0123"), 7));
    }
    let (poller, cursor, mut receiver) = poller_for(&node, Some(5)).await;

    assert_eq!(poller.poll_once().await.unwrap(), 2);

    assert_eq!(*cursor.lock().await, Some(7));
    assert_eq!(receiver.recv().await.unwrap().flight, "KL0123");
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn cursor_stays_put_when_the_coordinator_is_gone() {
    let node = StubNode::default();
    {
        let mut state = node.state();
        state.head = 12;
        state.logs.push(log_at(&request("ND1309"), 11));
    }
    let (poller, cursor, receiver) = poller_for(&node, Some(10)).await;
    drop(receiver);

    assert!(matches!(
        poller.poll_once().await,
        Err(ListenerError::CoordinatorGone)
    ));
    assert_eq!(*cursor.lock().await, Some(10));
}

#[tokio::test]
async fn unreachable_node_leaves_the_cursor_alone() {
    let cursor = Arc::new(Mutex::new(Some(3)));
    let (sender, _receiver) = mpsc::channel(1);
    let rpc = RpcClient::new("http://127.0.0.1:1", ReceiptPolling::default());
    let poller = LogPoller::new(
        Arc::new(rpc),
        APP_ADDRESS,
        Duration::from_millis(10),
        cursor.clone(),
        sender,
    );

    assert!(matches!(
        poller.poll_once().await,
        Err(ListenerError::Contract(_))
    ));
    assert_eq!(*cursor.lock().await, Some(3));
}

#[tokio::test]
async fn websocket_subscription_delivers_requests() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let expected = request("ND1309");
    let notification = json!({
        "jsonrpc": "2.0",
        "method": "eth_subscription",
        "params": { "subscription": "0x9ce5", "result": expected.to_log(APP_ADDRESS) },
    });

    let node = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();

        let subscribe: Value = match socket.next().await.unwrap().unwrap() {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        };
        socket
            .send(Message::Text(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x9ce5" }).to_string()))
            .await
            .unwrap();
        socket.send(Message::Text("{ not json".to_string())).await.unwrap();
        socket.send(Message::Text(notification.to_string())).await.unwrap();
        socket.send(Message::Close(None)).await.unwrap();
        subscribe
    });

    let (sender, mut receiver) = mpsc::channel(4);
    let outcome = WsSubscription::new(url, APP_ADDRESS, sender).start().await;

    assert!(matches!(outcome, Err(ListenerError::StreamClosed)));
    assert_eq!(receiver.recv().await.unwrap(), expected);

    let subscribe = node.await.unwrap();
    assert_eq!(subscribe["method"], "eth_subscribe");
    assert_eq!(subscribe["params"][0], "logs");
    assert_eq!(subscribe["params"][1]["address"], json!(APP_ADDRESS));
    assert_eq!(subscribe["params"][1]["topics"], json!([OracleRequest::topic()]));
}

#[tokio::test]
async fn rejected_subscription_is_reported() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = socket.next().await;
        let rejection = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32601, "message": "the method eth_subscribe does not exist" },
        });
        let _ = socket.send(Message::Text(rejection.to_string())).await;
    });

    let (sender, _receiver) = mpsc::channel(1);
    let outcome = WsSubscription::new(url, APP_ADDRESS, sender).start().await;

    assert!(matches!(outcome, Err(ListenerError::Subscription(_))));
}
