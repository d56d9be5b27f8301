//! Authentication middleware

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
    http::header::AUTHORIZATION,
};
use sha2::{Sha256, Digest};

use crate::{AppState, AppError};

/// Middleware: require `Authorization: Bearer <secret>` when a webhook
/// secret is configured. Runs before the body is read.
pub async fn require_webhook_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let token = extract_bearer_token(&req)?;

        // Compare digests so the check does not short-circuit on a prefix
        if hash_token(&token) != hash_token(secret) {
            tracing::warn!("Rejected request to {} with invalid token", req.uri().path());
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Result<String, AppError> {
    let auth_header = req.headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/incidents");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(extract_bearer_token(&request(Some("Bearer abc"))).unwrap(), "abc");
        assert!(extract_bearer_token(&request(Some("Basic abc"))).is_err());
        assert!(extract_bearer_token(&request(Some("bearer abc"))).is_err());
        assert!(extract_bearer_token(&request(None)).is_err());
    }

    #[test]
    fn test_bearer_token_is_taken_verbatim() {
        let token = extract_bearer_token(&request(Some("Bearer   abc  "))).unwrap();
        assert_eq!(token, "  abc  ");
        assert_ne!(hash_token(&token), hash_token("abc"));
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_token("s3cret"), hash_token("s3cret"));
        assert_ne!(hash_token("s3cret"), hash_token("s3cret "));
    }
}
