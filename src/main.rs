//! OpsMedic Agent server entry point

use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opsmedic_agent::{
    config::{Config, LlmConfig},
    create_router, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "opsmedic_agent=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("OpsMedic Agent starting...");
    tracing::info!("LLM configuration: {:?}", LlmConfig::from_env());
    tracing::info!("Restart allow-list: {:?}", config.allowed_containers);

    if config.webhook_secret.is_none() {
        if config.is_production() {
            tracing::warn!("WEBHOOK_SECRET is not set; ingestion is open to any caller");
        } else {
            tracing::debug!("WEBHOOK_SECRET is not set; ingestion is unauthenticated");
        }
    }

    let ip: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.host))?;
    let addr = SocketAddr::new(ip, config.port);

    // Build application state
    let state = AppState::from_config(config).context("Failed to build application state")?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚑 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("OpsMedic Agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
