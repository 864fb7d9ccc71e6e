//! lico-api - Life companion HTTP service
//!
//! Startup order: config, tracing, root folder and database, event bus and
//! LLM client, automation engine, then the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lico_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use lico_common::db::init_database;
use lico_common::events::EventBus;
use lico_api::llm::OllamaClient;
use lico_api::{build_router, AppState, ServiceConfig};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 5780;
const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for lico-api
#[derive(Parser, Debug)]
#[command(name = "lico-api")]
#[command(about = "Life companion API service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "LICO_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "LICO_BIND")]
    bind: Option<String>,

    /// Root folder holding lico.db
    #[arg(short, long, env = "LICO_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bearer token expected on /api/cron routes
    #[arg(long, env = "LICO_CRON_SECRET", hide_env_values = true)]
    cron_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting lico-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("lico-api")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let event_bus = EventBus::new(
        config
            .event_bus_capacity
            .unwrap_or(DEFAULT_EVENT_BUS_CAPACITY),
    );

    let mut ollama = config.ollama.clone();
    ollama.apply_env();
    let llm = OllamaClient::new(&ollama).context("Failed to build LLM client")?;
    info!("LLM endpoint {} (model {})", ollama.base_url, ollama.model);

    let cron_secret = args
        .cron_secret
        .clone()
        .or_else(|| config.cron_secret.clone())
        .filter(|s| !s.is_empty());
    if cron_secret.is_none() {
        warn!("No cron secret configured; /api/cron routes will reject every call");
    }

    let service_config = ServiceConfig {
        cron_secret,
        insights: config.insights.clone(),
        session_ttl_hours: config.sessions.ttl_hours,
    };

    let state = AppState::new(pool, event_bus, Arc::new(llm), service_config);
    let _engine = state.engine.clone().spawn(&state.event_bus);
    info!("Automation engine subscribed to event bus");

    let app = build_router(state);

    let bind = args
        .bind
        .or_else(|| config.bind_address.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("lico-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
