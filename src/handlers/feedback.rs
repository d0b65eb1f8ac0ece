//! Model feedback handler

use axum::Json;

use crate::models::{FeedbackRequest, FeedbackResponse};
use crate::AppResult;

/// Accept classifier feedback.
///
/// Logged for offline review only; feedback never influences live detection
/// and is not persisted across restarts.
pub async fn submit(Json(req): Json<FeedbackRequest>) -> AppResult<Json<FeedbackResponse>> {
    tracing::info!(
        session_id = %req.session_id,
        was_correct = req.was_correct,
        actual_label = %req.actual_label,
        "Feedback received"
    );

    Ok(Json(FeedbackResponse {
        status: "feedback_received",
    }))
}
