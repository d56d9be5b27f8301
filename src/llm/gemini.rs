//! Gemini backend (generateContent REST API)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::decode::decode_model_text;
use super::{DiagnosisBackend, ProviderError};
use crate::models::DiagnosisResult;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Google Gemini provider
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, api_key: String, endpoint: String, model: String) -> Self {
        Self {
            http,
            api_key,
            endpoint,
            model,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl DiagnosisBackend for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<DiagnosisResult, ProviderError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let text = body
            .text()
            .ok_or_else(|| ProviderError::Parse("Gemini returned no candidate text".to_string()))?;

        tracing::debug!(model = %self.model, "Gemini responded with {} bytes", text.len());
        Ok(decode_model_text(&text))
    }
}
