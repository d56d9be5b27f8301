//! OpsMedic Agent
//!
//! Receives SLO-breach alerts, asks a language-model backend for a diagnosis
//! and restarts allow-listed containers when the model recommends it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       OPSMEDIC AGENT                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  POST /webhook ─► auth ─► parse/validate                     │
//! │                               │                              │
//! │                               ▼                              │
//! │   ┌────────────┐   ┌──────────────┐   ┌──────────────────┐   │
//! │   │ Dispatcher │──►│ Remediation  │──►│ Incident Ledger  │   │
//! │   │ (LLM call) │   │ Gate (docker)│   │ (bounded, 1000)  │   │
//! │   └─────┬──────┘   └──────────────┘   └────────┬─────────┘   │
//! │         ▼                                      ▼             │
//! │  Gemini / Llama / FastRouter          GET /incidents         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod remediation;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

use config::{Config, LlmSettings};
use dispatcher::DiagnosisDispatcher;
use ledger::IncidentLedger;
use llm::ProviderError;
use remediation::{ContainerRuntime, DockerCli, RemediationGate};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: DiagnosisDispatcher,
    pub gate: RemediationGate,
    pub ledger: Arc<IncidentLedger>,
}

impl AppState {
    /// Wire every component with an explicit runtime
    pub fn new(
        config: Config,
        settings: LlmSettings,
        runtime: Arc<dyn ContainerRuntime>,
        ledger: Arc<IncidentLedger>,
    ) -> Result<Self, ProviderError> {
        let gate = RemediationGate::new(
            runtime,
            config.allowed_containers.clone(),
            config.remediation_timeout,
        );

        Ok(Self {
            dispatcher: DiagnosisDispatcher::new(settings)?,
            gate,
            ledger,
            config: Arc::new(config),
        })
    }

    /// Production wiring: live environment settings and the Docker CLI
    pub fn from_config(config: Config) -> Result<Self, ProviderError> {
        let runtime = Arc::new(DockerCli::new(config.docker_bin.clone()));
        Self::new(
            config,
            LlmSettings::Environment,
            runtime,
            Arc::new(IncidentLedger::new()),
        )
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check));

    // Ingestion and query routes (webhook secret, when configured)
    let protected_routes = Router::new()
        .route("/webhook", post(handlers::webhook::receive))
        .route("/alert", post(handlers::webhook::receive))
        .route("/incidents", get(handlers::incidents::list))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_webhook_auth
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
