//! Single-shot detection handler

use axum::extract::{Multipart, State};
use axum::Json;

use crate::detector::run_detect;
use crate::models::DetectionResult;
use crate::{AppError, AppResult, AppState};

/// Analyze one uploaded frame. Stateless: no session is involved.
pub async fn detect_frame(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<DetectionResult>> {
    let bytes = read_upload(multipart).await?;

    let image = image::load_from_memory(&bytes).map_err(|_| AppError::InvalidImage)?;

    let result = run_detect(state.detector.clone(), image, state.detector_timeout()).await?;

    Ok(Json(result))
}

/// Pull the first file field out of a multipart body
pub async fn read_upload(mut multipart: Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
    {
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        if !bytes.is_empty() {
            return Ok(bytes.to_vec());
        }
    }

    Err(AppError::InvalidImage)
}
