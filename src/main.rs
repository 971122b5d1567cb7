//! NEMT router - route optimization and live re-routing service for
//! non-emergency medical transport.

mod cli;
mod clock;
mod config;
mod defaults;
mod error;
mod handlers;
mod services;
mod types;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use redis::aio::ConnectionManager;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use handlers::AppState;
use handlers::ws::SessionRegistry;
use services::distance_matrix::{CachedMatrixProvider, GoogleMatrixConfig, GoogleMatrixProvider, MatrixProvider, MockMatrixProvider};
use services::state_store::DriverStateStore;
use services::vrp::SolverConfig;
use services::worker::{GpsDispatcher, WorkerContext};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    match cli.command {
        Some(cli::Command::Serve) | None => run_server(config).await,
    }
}

async fn run_server(config: Config) -> Result<()> {
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "nemt-router.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,nemt_router=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!("Starting NEMT router...");

    let redis_client = redis::Client::open(config.redis_url.as_str()).ok();
    let redis_manager = match &redis_client {
        Some(client) => match ConnectionManager::new(client.clone()).await {
            Ok(manager) => {
                info!("Connected to Redis at {}", config.redis_url);
                Some(manager)
            }
            Err(e) => {
                warn!(error = %e, "Redis unreachable at startup, degrading to no-op cache/state/pubsub");
                None
            }
        },
        None => {
            warn!("invalid REDIS_URL, degrading to no-op cache/state/pubsub");
            None
        }
    };

    let matrix_provider: Box<dyn MatrixProvider> = match &config.maps_api_key {
        Some(api_key) => Box::new(GoogleMatrixProvider::new(GoogleMatrixConfig {
            base_url: config.maps_api_base_url.clone(),
            api_key: api_key.clone(),
            timeout_seconds: 10,
        })),
        None => {
            warn!("GOOGLE_MAPS_API_KEY not set, using the mock distance-matrix provider");
            Box::new(MockMatrixProvider::new())
        }
    };
    let matrix_provider = Arc::new(CachedMatrixProvider::new(
        matrix_provider,
        redis_manager.clone(),
        config.matrix_cache_ttl_seconds,
    ));

    let state_store = Arc::new(DriverStateStore::new(
        redis_manager.clone(),
        config.driver_state_ttl_seconds,
        config.gps_ttl_seconds,
    ));

    let config = Arc::new(config);
    let solver_config = SolverConfig::new(config.max_optimization_seconds as u32, 3000);

    let worker_ctx = WorkerContext {
        state_store: state_store.clone(),
        matrix_provider: matrix_provider.clone(),
        redis: redis_manager.clone(),
        config: config.clone(),
    };
    let dispatcher = Arc::new(GpsDispatcher::new(worker_ctx));

    let state = AppState {
        config: config.clone(),
        matrix_provider,
        state_store,
        dispatcher,
        solver_config,
        redis_manager,
        redis_client,
        sessions: Arc::new(SessionRegistry::new()),
    };

    let app = handlers::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "server exited with error");
            anyhow::anyhow!(e)
        })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}
