//! FlightSurety Oracle Server
//!
//! Registers the simulated oracle pool, serves the status control API and
//! answers `OracleRequest` events until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flightsurety_oracles::app_state::AppState;
use flightsurety_oracles::chain::{FlightSuretyChain, JsonRpcChain};
use flightsurety_oracles::config::ServerConfig;
use flightsurety_oracles::dispatcher::Dispatcher;
use flightsurety_oracles::event_listener::EventListener;
use flightsurety_oracles::models::FlightStatus;
use flightsurety_oracles::pool::IdentityPool;
use flightsurety_oracles::routes;
use flightsurety_oracles::services::{resolve_signers, ProvisioningService, ResponseSubmitter};
use flightsurety_oracles::status::StatusControl;

const REQUEST_QUEUE_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;

    let chain: Arc<dyn FlightSuretyChain> =
        Arc::new(JsonRpcChain::new(config.chain.clone()).context("could not build JSON-RPC client")?);
    let signers = resolve_signers(&config.oracles, chain.as_ref())
        .await
        .context("could not resolve oracle identities")?;
    let pool = Arc::new(IdentityPool::new(signers, config.oracles.index_max)?);
    let status = StatusControl::new(FlightStatus::OnTime);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Serve the control surface while provisioning runs
    let app = routes::build_router(AppState::new(status.clone(), pool.clone()), &config.http.cors_allowed_origins);
    let addr = SocketAddr::new(config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    info!("Server listening on {}", addr);
    let mut server_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    let summary = ProvisioningService::new(chain.clone(), pool.clone(), config.oracles.provisioning_timeout)
        .run()
        .await;
    for (signer, reason) in &summary.failures {
        warn!(?signer, %reason, "oracle unavailable for this run");
    }
    if summary.succeeded == 0 {
        warn!("no oracle was provisioned; requests will go unanswered");
    }

    let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
    let submitter = Arc::new(ResponseSubmitter::new(
        chain.clone(),
        status.clone(),
        config.oracles.submission_timeout,
    ));
    let dispatcher = tokio::spawn(Dispatcher::new(pool.clone(), submitter).run(request_rx));
    let event_listener = tokio::spawn(
        EventListener::new(chain.clone(), config.events.clone(), request_tx).run(shutdown_rx.clone()),
    );

    shutdown_signal().await;
    info!("shutdown requested; draining in-flight submissions");
    if shutdown_tx.send(true).is_err() {
        warn!("no task was listening for shutdown");
    }

    // The listener owns the request sender; once it stops the dispatcher drains.
    event_listener.await.context("event listener task failed")?;
    let stats = dispatcher.await.context("dispatcher task failed")?;
    server
        .await
        .context("http server task failed")?
        .context("http server error")?;

    info!(
        requests = stats.requests,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "oracle server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
