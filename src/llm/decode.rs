//! Model output decoding
//!
//! Two stages: try the structured `{root_cause, recommended_action,
//! justification}` shape first, otherwise keep the raw text under
//! `diagnosis`. Decoding never fails.

use serde_json::{Map, Value};

use crate::models::DiagnosisResult;

/// Decode free text returned by a model
pub fn decode_model_text(text: &str) -> DiagnosisResult {
    let candidate = strip_code_fence(text.trim());
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => from_object(&map),
        _ => DiagnosisResult::free_text(text),
    }
}

/// Read the known fields from a JSON object. Unknown actions are dropped.
pub fn from_object(map: &Map<String, Value>) -> DiagnosisResult {
    DiagnosisResult {
        root_cause: string_field(map, "root_cause"),
        recommended_action: string_field(map, "recommended_action").and_then(|a| a.parse().ok()),
        justification: string_field(map, "justification"),
        diagnosis: string_field(map, "diagnosis"),
        error: string_field(map, "error"),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Models like to wrap JSON in ```json fences
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (e.g. "json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendedAction;

    #[test]
    fn test_structured_output() {
        let result = decode_model_text(
            r#"{"root_cause": "leak", "recommended_action": "RESTART", "justification": "reclaim memory"}"#,
        );
        assert_eq!(result.root_cause.as_deref(), Some("leak"));
        assert_eq!(result.recommended_action, Some(RecommendedAction::Restart));
        assert_eq!(result.justification.as_deref(), Some("reclaim memory"));
        assert!(result.diagnosis.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_fenced_output() {
        let text = "```json\n{\"root_cause\": \"cpu spin\", \"recommended_action\": \"scale_out\"}\n```\n";
        let result = decode_model_text(text);
        assert_eq!(result.root_cause.as_deref(), Some("cpu spin"));
        assert_eq!(result.recommended_action, Some(RecommendedAction::ScaleOut));
    }

    #[test]
    fn test_free_text_falls_back_to_diagnosis() {
        let text = "The container is probably leaking memory; restart it.";
        let result = decode_model_text(text);
        assert_eq!(result.diagnosis.as_deref(), Some(text));
        assert!(result.recommended_action.is_none());
        assert_eq!(result.action(), RecommendedAction::Ignore);
    }

    #[test]
    fn test_non_object_json_is_free_text() {
        let result = decode_model_text("[1, 2, 3]");
        assert_eq!(result.diagnosis.as_deref(), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_unknown_action_is_absent() {
        let result = decode_model_text(r#"{"root_cause": "x", "recommended_action": "REBOOT_HOST"}"#);
        assert_eq!(result.root_cause.as_deref(), Some("x"));
        assert!(result.recommended_action.is_none());
    }
}
