//! # Radar Hub Server
//!
//! HTTP API for facility edits plus the WebSocket relay for controllers.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize tracing (RUST_LOG or "info,radar=debug,sqlx=warn")      │
//! │  2. Load sync.toml, apply RADAR_* overrides, validate                  │
//! │  3. Connect to SQLite & run migrations                                 │
//! │  4. Pick transport: Redis when configured, else the in-process bus     │
//! │  5. Build ConfigService and start HubServer                            │
//! │  6. Wait for Ctrl+C / SIGTERM, stop the server, close the pool         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! radar-hub                       # default config path
//! radar-hub --config ./sync.toml  # explicit config file
//! RADAR_REDIS_URL=redis://localhost radar-hub
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use radar_db::Database;
use radar_sync::{
    ConfigService, HubServer, LocalBus, RedisTransport, SqliteConfigStore, SyncConfig, Transport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,radar=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Some(config_path) = parse_args()? else {
        return Ok(());
    };

    info!("Starting radar hub server...");

    // Load configuration
    let config = SyncConfig::load(config_path)?;
    info!(
        db = %config.database.path.display(),
        port = config.hub.port,
        transport = if config.redis_url().is_some() { "redis" } else { "local" },
        "Configuration loaded"
    );

    // Connect to database
    let db = Database::new(config.db_config()).await?;
    let facilities = db.facilities().count().await?;
    info!(facilities, "Database ready");

    // Select transport
    let (transport, bus): (Arc<dyn Transport>, Option<LocalBus>) = match config.redis_url() {
        Some(url) => (Arc::new(RedisTransport::connect(url).await?), None),
        None => {
            let bus = LocalBus::new(config.transport.bus_capacity);
            (Arc::new(bus.clone()), Some(bus))
        }
    };

    let store = Arc::new(SqliteConfigStore::new(db.clone()));
    let service = ConfigService::new(store.clone(), store, transport, config.limits);

    let handle = HubServer::new(config.hub.clone(), service, bus).start().await?;
    info!(addr = %handle.local_addr(), "Hub server listening");

    shutdown_signal().await;

    handle.shutdown().await?;
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Returns the `--config` path, or `None` when only help was requested.
fn parse_args() -> Result<Option<Option<PathBuf>>, String> {
    let args: Vec<String> = env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    return Err("--config requires a path".into());
                }
            }
            "--help" | "-h" => {
                println!("Radar hub server");
                println!();
                println!("Usage: radar-hub [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                println!();
                println!("Environment:");
                println!("  RUST_LOG             Log filter");
                println!("  RADAR_DB_PATH, RADAR_HUB_PORT, RADAR_BIND_ADDR, RADAR_REDIS_URL, ...");
                return Ok(None);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(Some(config_path))
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
