//! Diagnosis backends
//!
//! One backend is active per call, picked by name from [`LlmConfig`]:
//!
//! ```text
//! "gemini"        -> GeminiProvider      (generateContent REST)
//! "llama"         -> CompletionProvider  (prompt/choices completion)
//! "fastrouter*"   -> CompletionProvider  (prompt/choices completion)
//! anything else   -> ProviderError::UnknownProvider, no network call
//! ```
//!
//! Backends never raise past [`Provider::call`]; every failure becomes a
//! [`DiagnosisResult`] with `error` set.

pub mod completion;
pub mod decode;
pub mod gemini;
pub mod prompt;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::models::DiagnosisResult;

pub use completion::CompletionProvider;
pub use gemini::GeminiProvider;
pub use prompt::build_prompt;

/// Per-call timeout for every diagnosis backend
pub const DIAGNOSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Diagnosis backend errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Configuration(String),

    #[error("Invalid LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Request timed out after {}s", DIAGNOSIS_TIMEOUT.as_secs())]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Backend name as configured, normalized (trimmed, lowercased)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Llama,
    FastRouter,
    Unknown(String),
}

impl ProviderKind {
    pub fn parse(name: &str) -> Self {
        let normalized = name.trim().to_lowercase();
        match normalized.as_str() {
            "gemini" => ProviderKind::Gemini,
            "llama" => ProviderKind::Llama,
            n if n.starts_with("fastrouter") => ProviderKind::FastRouter,
            _ => ProviderKind::Unknown(normalized),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Gemini => f.write_str("gemini"),
            ProviderKind::Llama => f.write_str("llama"),
            ProviderKind::FastRouter => f.write_str("fastrouter"),
            ProviderKind::Unknown(name) => f.write_str(name),
        }
    }
}

/// Common capability of every backend
#[async_trait]
pub trait DiagnosisBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<DiagnosisResult, ProviderError>;
}

/// A configured, ready-to-call backend
pub enum Provider {
    Gemini(GeminiProvider),
    Llama(CompletionProvider),
    FastRouter(CompletionProvider),
}

impl Provider {
    /// Resolve the backend for `kind`, failing fast on missing credentials
    pub fn from_config(
        kind: &ProviderKind,
        config: &LlmConfig,
        http: &reqwest::Client,
    ) -> Result<Self, ProviderError> {
        match kind {
            ProviderKind::Gemini => {
                let api_key = config.gemini_api_key.clone().ok_or_else(|| {
                    ProviderError::Configuration("Gemini API key not configured".to_string())
                })?;
                Ok(Provider::Gemini(GeminiProvider::new(
                    http.clone(),
                    api_key,
                    config.gemini_endpoint.clone(),
                    config.gemini_model.clone(),
                )))
            }
            ProviderKind::Llama => {
                let (api_key, endpoint) = credentials_pair(
                    "Llama",
                    &config.llama_api_key,
                    &config.llama_endpoint,
                )?;
                Ok(Provider::Llama(CompletionProvider::new(
                    "Llama",
                    http.clone(),
                    api_key,
                    endpoint,
                    config.max_tokens,
                )))
            }
            ProviderKind::FastRouter => {
                let (api_key, endpoint) = credentials_pair(
                    "FastRouter",
                    &config.fastrouter_api_key,
                    &config.fastrouter_endpoint,
                )?;
                Ok(Provider::FastRouter(CompletionProvider::new(
                    "FastRouter",
                    http.clone(),
                    api_key,
                    endpoint,
                    config.max_tokens,
                )))
            }
            ProviderKind::Unknown(name) => Err(ProviderError::UnknownProvider(name.clone())),
        }
    }

    fn backend(&self) -> &dyn DiagnosisBackend {
        match self {
            Provider::Gemini(p) => p,
            Provider::Llama(p) | Provider::FastRouter(p) => p,
        }
    }

    /// Send the prompt. Transport and decode failures come back as an
    /// error-shaped result, never as `Err`.
    pub async fn call(&self, prompt: &str) -> DiagnosisResult {
        match self.backend().complete(prompt).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Error calling {} API: {}", self.label(), e);
                DiagnosisResult::failure(e.to_string())
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::Gemini(_) => "Gemini",
            Provider::Llama(_) => "Llama",
            Provider::FastRouter(_) => "FastRouter",
        }
    }
}

fn credentials_pair(
    label: &str,
    api_key: &Option<String>,
    endpoint: &Option<String>,
) -> Result<(String, String), ProviderError> {
    match (api_key, endpoint) {
        (Some(key), Some(url)) => Ok((key.clone(), url.clone())),
        _ => Err(ProviderError::Configuration(format!(
            "{} API key or endpoint not configured",
            label
        ))),
    }
}

/// Shared HTTP client with the fixed diagnosis timeout
pub fn build_http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(DIAGNOSIS_TIMEOUT)
        .user_agent(concat!("opsmedic-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Configuration(format!("Failed to create HTTP client: {}", e)))
}
