//! FlightSurety oracle server
//!
//! Registers every node account as an oracle, answers flight-status requests
//! emitted by `FlightSuretyApp` and serves the dapp HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use flightsurety_server::app_state::AppState;
use flightsurety_server::chain::rpc::RpcClient;
use flightsurety_server::chain::{FlightSuretyApp, FlightSuretyContract, OracleContract};
use flightsurety_server::config::{EventTransport, ServerConfig};
use flightsurety_server::routes;
use flightsurety_server::services::event_monitoring_service::{
    ListenerError, LogPoller, RequestListener, WsSubscription,
};
use flightsurety_server::services::{oracle_registration, DappClient, OracleCoordinator};

const LISTENER_SUPERVISOR_MAX_BACKOFF_SECONDS: u64 = 30;
const REQUEST_QUEUE_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env().context("loading configuration")?;
    info!(network = %config.network_name, url = %config.network.url, app = %config.network.app_address, "using network");

    let rpc = Arc::new(RpcClient::new(config.network.url.clone(), config.receipts));
    let app = Arc::new(FlightSuretyApp::new(Arc::clone(&rpc), config.network.app_address));
    let oracle_contract: Arc<dyn OracleContract> = app.clone();
    let dapp_contract: Arc<dyn FlightSuretyContract> = app.clone();

    // Oracle registration
    let roster = oracle_registration::load_roster(app.as_ref())
        .await
        .context("enumerating node accounts")?;
    oracle_registration::register_oracles(
        oracle_contract.as_ref(),
        &roster,
        config.oracle.registration_gas,
    )
    .await
    .context("registering oracles")?;

    // Oracle response coordination
    let (requests_tx, requests_rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
    let coordinator = Arc::new(OracleCoordinator::new(
        oracle_contract,
        roster,
        config.oracle.max_in_flight,
    ));
    tokio::spawn(coordinator.run(requests_rx));

    // Start and supervise the OracleRequest listener.
    let listener_config = config.clone();
    let poll_cursor = Arc::new(Mutex::new(None));
    tokio::spawn(async move {
        let mut restart_count: u32 = 0;
        loop {
            let listener = match listener_config.oracle.transport {
                EventTransport::WebSocket => RequestListener::WebSocket(WsSubscription::new(
                    listener_config.network.websocket_url(),
                    listener_config.network.app_address,
                    requests_tx.clone(),
                )),
                EventTransport::Polling => RequestListener::Polling(LogPoller::new(
                    Arc::clone(&rpc),
                    listener_config.network.app_address,
                    listener_config.oracle.poll_interval,
                    Arc::clone(&poll_cursor),
                    requests_tx.clone(),
                )),
            };
            let handle = tokio::spawn(listener.start());

            match handle.await {
                Ok(Ok(())) => {
                    info!("OracleRequest listener exited cleanly; stopping supervisor");
                    break;
                }
                Ok(Err(ListenerError::CoordinatorGone)) => {
                    error!("oracle coordinator stopped; stopping listener supervisor");
                    break;
                }
                Ok(Err(err)) => {
                    error!(error = %err, "OracleRequest listener failed; restarting");
                }
                Err(join_error) => {
                    if join_error.is_panic() {
                        error!("OracleRequest listener panicked; restarting");
                    } else {
                        error!(error = %join_error, "OracleRequest listener task failed; restarting");
                    }
                }
            }

            restart_count = restart_count.saturating_add(1);
            let backoff_seconds = (2u64.saturating_pow(restart_count.min(5)))
                .min(LISTENER_SUPERVISOR_MAX_BACKOFF_SECONDS);
            warn!(restart_count, backoff_seconds, "listener restart backoff");
            sleep(Duration::from_secs(backoff_seconds)).await;
        }
    });

    // Dapp client
    let dapp = match DappClient::initialize(dapp_contract).await {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            warn!(error = %err, "dapp routes disabled");
            None
        }
    };

    let router = routes::router(AppState::new(dapp))
        .layer(build_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, router).await.context("serving HTTP")?;
    Ok(())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
}
