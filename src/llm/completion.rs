//! Prompt/choices completion backends (Llama, FastRouter)

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::decode::{decode_model_text, from_object};
use super::{DiagnosisBackend, ProviderError};
use crate::models::DiagnosisResult;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

/// Bearer-authenticated completion endpoint
pub struct CompletionProvider {
    label: &'static str,
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
}

impl CompletionProvider {
    pub fn new(
        label: &'static str,
        http: reqwest::Client,
        api_key: String,
        endpoint: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            label,
            http,
            api_key,
            endpoint,
            max_tokens,
        }
    }
}

#[async_trait]
impl DiagnosisBackend for CompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<DiagnosisResult, ProviderError> {
        let request = CompletionRequest {
            prompt,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        tracing::debug!(provider = self.label, "Completion response received");
        Ok(normalize_completion(&body))
    }
}

/// Pull the generated text out of a completion body.
///
/// Accepts `choices[0].text` and chat-style `choices[0].message.content`.
/// A body without choices is read as a diagnosis object directly.
pub fn normalize_completion(body: &Value) -> DiagnosisResult {
    let first_choice = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first());

    if let Some(choice) = first_choice {
        let text = choice
            .get("text")
            .and_then(Value::as_str)
            .or_else(|| {
                choice
                    .get("message")
                    .and_then(|m| m.get("content"))
                    .and_then(Value::as_str)
            })
            .unwrap_or_default();
        return decode_model_text(text);
    }

    match body {
        Value::Object(map) => from_object(map),
        other => decode_model_text(&other.to_string()),
    }
}
