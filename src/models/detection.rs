//! Detection result and calibration/feedback payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-frame classifier output.
///
/// `is_deepfake`, `confidence` and `timestamp` are required and validated at
/// the detector boundary; anything else the classifier attaches rides along
/// untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_deepfake: bool,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Facial landmark points extracted for calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmarks {
    pub points: Vec<(f32, f32)>,
}

/// Unpersisted per-user calibration baseline
#[derive(Debug, Serialize)]
pub struct CalibrationBaseline {
    pub status: &'static str,
    pub user_id: String,
    pub facial_features: Vec<(f32, f32)>,
    pub timestamp: DateTime<Utc>,
}

/// Model feedback submission (logged only, never persisted)
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub session_id: String,
    pub was_correct: bool,
    pub actual_label: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
}
