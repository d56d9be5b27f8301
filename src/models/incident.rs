//! Incident model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::diagnosis::{DiagnosisResult, RecommendedAction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContainerInfo {
    #[validate(custom(function = "not_blank"))]
    pub id: String,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Evidence bundle forwarded to the model untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_snapshot: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlated_logs: Option<String>,
}

/// Inbound alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct IncidentPayload {
    #[validate(length(min = 1, max = 256, message = "must be between 1 and 256 characters"))]
    pub incident_id: String,
    #[validate(custom(function = "iso8601"))]
    pub timestamp: String,
    #[validate(custom(function = "not_blank"))]
    pub breached_slo: String,
    #[validate(nested)]
    pub container_info: ContainerInfo,
    pub observability_context: ObservabilityContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationStatus {
    Success,
    Failed,
    NotAttempted,
}

impl RemediationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemediationStatus::Success => "SUCCESS",
            RemediationStatus::Failed => "FAILED",
            RemediationStatus::NotAttempted => "NOT_ATTEMPTED",
        }
    }
}

impl std::fmt::Display for RemediationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry. Built once per accepted alert and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub record_id: Uuid,
    pub incident_id: String,
    pub timestamp: String,
    pub breached_slo: String,
    pub container_info: ContainerInfo,
    pub observability_context: ObservabilityContext,
    pub root_cause: String,
    pub recommended_action: RecommendedAction,
    pub remediation_status: RemediationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_message: Option<String>,
    pub ai_justification: String,
    pub received_at: DateTime<Utc>,
}

impl IncidentRecord {
    pub fn new(
        payload: IncidentPayload,
        diagnosis: &DiagnosisResult,
        remediation_status: RemediationStatus,
        remediation_message: Option<String>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            incident_id: payload.incident_id,
            timestamp: payload.timestamp,
            breached_slo: payload.breached_slo,
            container_info: payload.container_info,
            observability_context: payload.observability_context,
            root_cause: diagnosis.root_cause_or_default().to_string(),
            recommended_action: diagnosis.action(),
            remediation_status,
            remediation_message,
            ai_justification: diagnosis.justification_or_default().to_string(),
            received_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct IncidentFilter {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct IncidentListResponse {
    pub incidents: Vec<IncidentRecord>,
    pub total: usize,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

// Extended and basic ISO-8601 layouts; seconds and fraction are optional.
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Accepts an ISO-8601 date, or date-time with or without a UTC offset
/// (`Z`, `+hh:mm`, `+hhmm` or `+hh`)
fn iso8601(value: &str) -> Result<(), ValidationError> {
    if is_iso8601(value.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("iso8601");
        err.message = Some("must be an ISO-8601 timestamp".into());
        Err(err)
    }
}

fn is_iso8601(value: &str) -> bool {
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }

    let zoned = match value.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+00:00", rest),
        None => value.to_string(),
    };
    let with_offset = DATE_TIME_FORMATS.iter().any(|format| {
        DateTime::parse_from_str(&zoned, &format!("{}%#z", format)).is_ok()
    });

    with_offset
        || DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(value, format).is_ok())
}
