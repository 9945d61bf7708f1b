use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use supportq_core::{
    load_config, validate_config, Config, HttpTicketStore, QueueController, SimulatedStore,
    SqliteTicketStore, StoreBackend, TicketStore,
};
use supportq_server::api::{create_router, WsBroadcaster};
use supportq_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SUPPORTQ_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);
    info!("Store backend: {:?}", config.store.backend);

    let ticket_store = create_local_store(&config)?;
    let queue_store = create_queue_store(&config, Arc::clone(&ticket_store))?;

    // Create WebSocket broadcaster for queue notifications
    let ws_broadcaster = WsBroadcaster::default();
    info!("WebSocket broadcaster initialized");

    let queue = Arc::new(QueueController::new(
        queue_store,
        Arc::new(ws_broadcaster.clone()),
        config.agent.id.clone(),
    ));
    info!("Queue controller ready for agent {}", queue.agent_id());

    // Initial load; a failure is reported and the queue starts empty.
    if let Err(e) = queue.refresh().await {
        warn!("Initial queue load failed: {}", e);
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        ticket_store,
        queue,
        ws_broadcaster,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// The SQLite store served by the `/tickets` API, with optional simulation.
fn create_local_store(config: &Config) -> Result<Arc<dyn TicketStore>> {
    let sqlite = SqliteTicketStore::new(&config.database.path)
        .context("Failed to create ticket store")?;
    info!("Ticket store initialized");

    if config.store.seed_demo {
        let seeded = sqlite
            .seed_demo_tickets()
            .context("Failed to seed demo tickets")?;
        if seeded > 0 {
            info!("Seeded {} demo tickets", seeded);
        }
    }

    let store: Arc<dyn TicketStore> = match &config.store.simulation {
        Some(simulation) => {
            info!(
                "Simulating store latency {}-{}ms, assign failure rate {}",
                simulation.min_delay_ms, simulation.max_delay_ms, simulation.failure_rate
            );
            Arc::new(SimulatedStore::new(sqlite, simulation.clone()))
        }
        None => Arc::new(sqlite),
    };
    Ok(store)
}

/// The store the agent queue talks to.
fn create_queue_store(
    config: &Config,
    local: Arc<dyn TicketStore>,
) -> Result<Arc<dyn TicketStore>> {
    match config.store.backend {
        StoreBackend::Local => Ok(local),
        StoreBackend::Remote => {
            let remote = config
                .store
                .remote
                .as_ref()
                .context("Remote backend selected but no [store.remote] config provided")?;
            info!(
                timeout_secs = remote.timeout_secs,
                "Queue uses a remote ticket service"
            );
            let store = HttpTicketStore::new(remote).context("Failed to create HTTP store")?;
            Ok(Arc::new(store))
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
