//! Session lookup and statistics handlers

use axum::extract::{Path, State};
use axum::Json;

use crate::models::SessionSummary;
use crate::registry::RegistryStats;
use crate::{AppError, AppResult, AppState};

/// Get one session's summary
pub async fn get(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionSummary>> {
    let session = state
        .registry
        .get(&session_id)
        .ok_or(AppError::SessionNotFound)?;

    let summary = session.read().summary();
    Ok(Json(summary))
}

/// Aggregate detection statistics across all registered sessions
pub async fn stats(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.stats())
}
