//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Boundary errors. Anything that happens after a payload is accepted is
/// recorded in the ledger instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Auth errors
    #[error("authentication required")]
    Unauthorized,

    // Validation errors
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("validation failed: {0}")]
    ValidationError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required".to_string()),
            AppError::MalformedJson(msg) => (StatusCode::BAD_REQUEST, format!("Malformed JSON: {}", msg)),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(describe_validation(&err))
    }
}

/// Flatten nested validator output into `field.path: code` pairs
fn describe_validation(errors: &validator::ValidationErrors) -> String {
    let mut parts = Vec::new();
    collect_validation(errors, "", &mut parts);
    parts.sort();
    parts.join("; ")
}

fn collect_validation(errors: &validator::ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    let detail = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(format!("{}: {}", path, detail));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_validation(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_validation(inner, &format!("{}[{}]", path, idx), out);
                }
            }
        }
    }
}
