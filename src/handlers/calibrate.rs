//! User calibration handler

use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;

use crate::detector::run_extract_landmarks;
use crate::handlers::detect::read_upload;
use crate::models::CalibrationBaseline;
use crate::{AppError, AppResult, AppState};

/// Build a per-user baseline from a reference image.
///
/// The baseline is returned to the caller, not persisted.
pub async fn calibrate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<CalibrationBaseline>> {
    let bytes = read_upload(multipart).await?;

    let image = image::load_from_memory(&bytes).map_err(|_| AppError::InvalidImage)?;

    let landmarks =
        run_extract_landmarks(state.detector.clone(), image, state.detector_timeout())
            .await?
            .ok_or(AppError::NoFaceDetected)?;

    tracing::info!("User {} calibrated successfully", user_id);

    Ok(Json(CalibrationBaseline {
        status: "calibrated",
        user_id,
        facial_features: landmarks.points,
        timestamp: Utc::now(),
    }))
}
