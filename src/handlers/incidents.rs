//! Incidents handlers

use axum::{
    extract::{rejection::QueryRejection, State, Query},
    Json,
};

use crate::{AppError, AppResult, AppState};
use crate::models::{IncidentFilter, IncidentListResponse};

/// Default page size for `GET /incidents`
pub const DEFAULT_LIMIT: usize = 100;

/// List recent incidents, newest first
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<IncidentFilter>, QueryRejection>,
) -> AppResult<Json<IncidentListResponse>> {
    let Query(filter) = query
        .map_err(|e| AppError::ValidationError(format!("Invalid query: {}", e.body_text())))?;
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).min(state.ledger.capacity());
    let incidents = state.ledger.recent(limit);

    Ok(Json(IncidentListResponse {
        incidents,
        total: state.ledger.count(),
    }))
}
