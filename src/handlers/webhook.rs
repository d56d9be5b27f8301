//! Alert ingestion handler

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use tracing::Instrument;
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::models::{DiagnosisResult, IncidentPayload, IncidentRecord, RemediationStatus};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub incident_id: String,
    pub diagnosis: DiagnosisResult,
    pub remediation: RemediationStatus,
}

/// Receive an alert: parse, validate, then run the incident pipeline.
///
/// Authentication has already happened in middleware. Parsing is done by
/// hand so malformed JSON and schema violations both map to 400.
pub async fn receive(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<WebhookResponse>> {
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::MalformedJson(e.to_string()))?;

    let payload: IncidentPayload = serde_json::from_value(value)
        .map_err(|e| AppError::ValidationError(format!("Invalid incident payload: {}", e)))?;

    payload.validate()?;

    let span = tracing::info_span!("incident", incident_id = %payload.incident_id);
    let response = process_incident(&state, payload).instrument(span).await;

    Ok(Json(response))
}

/// Diagnose, gate, record. Every call appends exactly one ledger record.
pub async fn process_incident(state: &AppState, payload: IncidentPayload) -> WebhookResponse {
    tracing::info!(
        "Received alert for container {} ({}): {}",
        payload.container_info.name,
        payload.container_info.id,
        payload.breached_slo
    );

    let diagnosis = state.dispatcher.diagnose(&payload).await;

    let outcome = state
        .gate
        .remediate(diagnosis.action(), &payload.container_info)
        .await;

    let message = match outcome.status {
        RemediationStatus::NotAttempted => None,
        _ => {
            tracing::info!(
                "Remediation result for container {}: {}",
                payload.container_info.name,
                outcome.message
            );
            Some(outcome.message)
        }
    };

    let incident_id = payload.incident_id.clone();
    state
        .ledger
        .append(IncidentRecord::new(payload, &diagnosis, outcome.status, message));

    WebhookResponse {
        status: "alert received",
        incident_id,
        diagnosis,
        remediation: outcome.status,
    }
}
