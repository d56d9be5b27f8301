//! Prompt construction

use std::fmt::Write;

use crate::models::IncidentPayload;

const PLACEHOLDER: &str = "N/A";

/// Render the diagnosis prompt for an incident.
///
/// Output depends only on the payload: identical payloads render
/// byte-identical prompts. Metrics are emitted as JSON with sorted keys.
pub fn build_prompt(incident: &IncidentPayload) -> String {
    let container = &incident.container_info;
    let context = &incident.observability_context;

    let metrics = context
        .metrics_snapshot
        .as_ref()
        .map(|m| serde_json::Value::Object(m.clone()).to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let trace_ids = context
        .trace_ids
        .as_ref()
        .map(|ids| serde_json::Value::from(ids.clone()).to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let logs = context.correlated_logs.as_deref().unwrap_or(PLACEHOLDER);
    let image = container.image.as_deref().unwrap_or(PLACEHOLDER);

    let mut prompt = String::with_capacity(1024);
    // Writing to a String cannot fail.
    let _ = writeln!(
        prompt,
        "You are a Senior Site Reliability Engineer (SRE) named OpsMedic. \
         Your task is to analyze system incidents and recommend the best course of action."
    );
    let _ = writeln!(
        prompt,
        "An incident has occurred for container '{}' (ID: {}, Image: {}).",
        container.name, container.id, image
    );
    let _ = writeln!(prompt, "**SLO Breached:** {}", incident.breached_slo);
    let _ = writeln!(prompt, "**Observability Context:**");
    let _ = writeln!(prompt, "Metrics Snapshot: {}", metrics);
    let _ = writeln!(prompt, "Trace IDs: {}", trace_ids);
    let _ = writeln!(prompt, "Correlated Logs: {}", logs);
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Analyze the provided context and determine the most likely root cause. \
         Then, recommend one of the following actions in JSON format: 'RESTART', 'SCALE_OUT', 'IGNORE'. \
         If 'RESTART', provide a brief justification."
    );
    let _ = writeln!(prompt, "Example Response:");
    prompt.push_str(
        r#"{"root_cause": "Likely memory leak due to X", "recommended_action": "RESTART", "justification": "To reclaim leaked memory and restore service health."}"#,
    );
    prompt
}
