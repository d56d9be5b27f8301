//! Diagnosis dispatcher
//!
//! Picks the active backend from the settings in effect at call time, renders
//! the prompt and forwards whatever the backend returns. Never retries.

use crate::config::LlmSettings;
use crate::llm::{build_http_client, build_prompt, Provider, ProviderError, ProviderKind};
use crate::models::{DiagnosisResult, IncidentPayload};

#[derive(Clone)]
pub struct DiagnosisDispatcher {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl DiagnosisDispatcher {
    pub fn new(settings: LlmSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_http_client()?,
            settings,
        })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Diagnose an incident. Always returns a result with an action set.
    pub async fn diagnose(&self, incident: &IncidentPayload) -> DiagnosisResult {
        let config = self.settings.current();
        let kind = ProviderKind::parse(&config.active_provider);
        let prompt = build_prompt(incident);

        tracing::info!("Diagnosing incident using LLM provider: {}", kind);

        let provider = match Provider::from_config(&kind, &config, &self.http) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::error!("Cannot diagnose incident {}: {}", incident.incident_id, e);
                return DiagnosisResult::failure(e.to_string()).normalized();
            }
        };

        let result = provider.call(&prompt).await.normalized();

        if result.is_error() {
            tracing::warn!(
                "Diagnosis for incident {} failed: {}",
                incident.incident_id,
                result.error.as_deref().unwrap_or_default()
            );
        } else {
            tracing::info!(
                "Diagnosis: Root Cause: {}, Recommended Action: {}, Justification: {}",
                result.root_cause_or_default(),
                result.action(),
                result.justification_or_default()
            );
        }

        result
    }
}
