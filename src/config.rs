//! Configuration module

use std::env;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

/// Default Gemini REST base URL
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Default FastRouter completion endpoint
pub const DEFAULT_FASTROUTER_ENDPOINT: &str = "https://go.fastrouter.ai/api/v1";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Bearer secret guarding ingestion and queries (open when `None`)
    pub webhook_secret: Option<String>,

    /// Container names the remediation gate may restart
    pub allowed_containers: Vec<String>,

    /// Container runtime CLI
    pub docker_bin: String,

    /// Upper bound on a single runtime call
    pub remediation_timeout: Duration,

    /// Emit JSON logs
    pub log_json: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8001),

            webhook_secret: non_empty(lookup("WEBHOOK_SECRET")),

            allowed_containers: lookup("ALLOWED_CONTAINERS")
                .map(|list| parse_list(&list))
                .unwrap_or_default(),

            docker_bin: non_empty(lookup("DOCKER_BIN")).unwrap_or_else(|| "docker".to_string()),

            remediation_timeout: Duration::from_secs(
                lookup("REMEDIATION_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),

            log_json: lookup("LOG_FORMAT")
                .map(|f| f.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),

            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Diagnosis backend settings, re-read on every diagnosis call
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub active_provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_endpoint: String,
    pub gemini_model: String,
    pub llama_api_key: Option<String>,
    pub llama_endpoint: Option<String>,
    pub fastrouter_api_key: Option<String>,
    pub fastrouter_endpoint: Option<String>,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            active_provider: lookup("ACTIVE_LLM_PROVIDER").unwrap_or_else(|| "gemini".to_string()),
            gemini_api_key: non_empty(lookup("GEMINI_API_KEY")),
            gemini_endpoint: non_empty(lookup("GEMINI_ENDPOINT"))
                .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
            gemini_model: non_empty(lookup("GEMINI_MODEL"))
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            llama_api_key: non_empty(lookup("LLAMA_API_KEY")),
            llama_endpoint: non_empty(lookup("LLAMA_ENDPOINT")),
            fastrouter_api_key: non_empty(lookup("FASTRTR_API_KEY")),
            fastrouter_endpoint: Some(
                non_empty(lookup("FASTRTR_ENDPOINT"))
                    .unwrap_or_else(|| DEFAULT_FASTROUTER_ENDPOINT.to_string()),
            ),
            max_tokens: lookup("LLM_MAX_TOKENS")
                .and_then(|t| t.parse().ok())
                .unwrap_or(512),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

// Hand-written so API keys never reach the logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("active_provider", &self.active_provider)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_endpoint", &self.gemini_endpoint)
            .field("gemini_model", &self.gemini_model)
            .field("llama_api_key", &redact(&self.llama_api_key))
            .field("llama_endpoint", &self.llama_endpoint)
            .field("fastrouter_api_key", &redact(&self.fastrouter_api_key))
            .field("fastrouter_endpoint", &self.fastrouter_endpoint)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Where the dispatcher reads its backend settings from.
///
/// `Environment` re-reads process variables on each call, so a changed
/// `ACTIVE_LLM_PROVIDER` takes effect on the next diagnosis. `Shared` holds
/// an in-process value that can be swapped at runtime.
#[derive(Debug, Clone)]
pub enum LlmSettings {
    Environment,
    Shared(Arc<RwLock<LlmConfig>>),
}

impl LlmSettings {
    pub fn fixed(config: LlmConfig) -> Self {
        Self::Shared(Arc::new(RwLock::new(config)))
    }

    /// Snapshot of the settings in effect right now
    pub fn current(&self) -> LlmConfig {
        match self {
            Self::Environment => LlmConfig::from_env(),
            Self::Shared(cell) => cell.read().clone(),
        }
    }

    /// Replace the shared settings. No-op for `Environment`.
    pub fn replace(&self, config: LlmConfig) {
        if let Self::Shared(cell) = self {
            *cell.write() = config;
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn redact(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "***" } else { "<unset>" }
}
