//! Marketplace - REST backend for buyers, sellers, carts and orders

use anyhow::{Context, Result};
use clap::Parser;
use marketplace_api::{AppState, create_router};
use marketplace_auth::{TokenBlacklist, TokenIssuer};
use marketplace_db::Database;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;

/// Marketplace - REST backend for buyers, sellers, carts and orders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "MARKETPLACE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "MARKETPLACE_PORT")]
    port: Option<u16>,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    config.validate()?;

    info!("Starting Marketplace v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    // Initialize database
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))?;

    let tokens = Arc::new(TokenIssuer::new(&config.jwt_config())?);

    // Create application state
    let state = AppState::new(Arc::new(db), tokens, config.database.allow_clear);
    if config.database.allow_clear {
        warn!("DELETE /seller/clear is enabled");
    }

    spawn_blacklist_reaper(
        state.blacklist.clone(),
        Duration::from_secs(config.auth.blacklist_reap_interval_secs),
    );

    // Create router
    let app = create_router(state, Some(Arc::new(metrics_handle)))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Periodically drop blacklist entries whose tokens have expired anyway
fn spawn_blacklist_reaper(blacklist: TokenBlacklist, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match blacklist.purge_expired().await {
                Ok(purged) => {
                    metrics::counter!("marketplace_blacklist_purged_total").increment(purged)
                }
                Err(e) => warn!("Blacklist purge failed: {}", e),
            }
        }
    });
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
