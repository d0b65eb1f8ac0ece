//! Detector boundary - classifier seam and async offload
//!
//! The classifier itself is an external collaborator; this module owns the
//! seam (trait + error type), a heuristic stand-in implementation, and the
//! offload path that keeps classifier latency off the connection loops.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use image::DynamicImage;
use rand::Rng;
use thiserror::Error;

use crate::models::{DetectionResult, Landmarks};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("classifier error: {0}")]
    Inference(String),

    #[error("detector invocation timed out")]
    Timeout,

    #[error("detector task failed: {0}")]
    Task(String),
}

/// Classifier capability required by the server.
///
/// Implementations must be safe to invoke concurrently; one shared instance
/// serves every session. `detect` must not fail for a structurally valid
/// image; `extract_landmarks` returns `None` when no face is found.
pub trait Detector: Send + Sync + 'static {
    fn detect(&self, image: &DynamicImage) -> Result<DetectionResult, DetectorError>;
    fn extract_landmarks(&self, image: &DynamicImage) -> Option<Landmarks>;
}

/// Run a detection on the blocking pool, bounded by `timeout`.
///
/// Classifier work is CPU-bound; without the offload one session's slow
/// frame would stall every other connection's loop.
pub async fn run_detect(
    detector: Arc<dyn Detector>,
    image: DynamicImage,
    timeout: Duration,
) -> Result<DetectionResult, DetectorError> {
    let task = tokio::task::spawn_blocking(move || detector.detect(&image));

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(DetectorError::Timeout),
        Ok(Err(join)) => Err(DetectorError::Task(join.to_string())),
        Ok(Ok(result)) => result,
    }
}

/// Run landmark extraction on the blocking pool, bounded by `timeout`
pub async fn run_extract_landmarks(
    detector: Arc<dyn Detector>,
    image: DynamicImage,
    timeout: Duration,
) -> Result<Option<Landmarks>, DetectorError> {
    let task = tokio::task::spawn_blocking(move || detector.extract_landmarks(&image));

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(DetectorError::Timeout),
        Ok(Err(join)) => Err(DetectorError::Task(join.to_string())),
        Ok(Ok(landmarks)) => Ok(landmarks),
    }
}

// ============================================================================
// HEURISTIC FALLBACK
// ============================================================================

/// Minimum image side for the face heuristic to consider a face present
const MIN_FACE_SIDE: u32 = 64;

/// Image-statistics stand-in for the real classifier.
///
/// Scores frames from luma variance: very flat or very noisy frames read as
/// synthetic. A small jitter keeps scores from being perfectly constant on
/// identical frames, matching how the real model behaves on video.
#[derive(Debug, Default)]
pub struct HeuristicDetector;

impl HeuristicDetector {
    pub fn new() -> Self {
        Self
    }

    fn luma_stats(image: &DynamicImage) -> (f32, f32) {
        let gray = image.to_luma8();
        let pixels = gray.as_raw();
        if pixels.is_empty() {
            return (0.0, 0.0);
        }

        let n = pixels.len() as f32;
        let mean = pixels.iter().map(|&p| p as f32).sum::<f32>() / n;
        let variance = pixels
            .iter()
            .map(|&p| (p as f32 - mean).powi(2))
            .sum::<f32>()
            / n;

        (mean, variance)
    }
}

impl Detector for HeuristicDetector {
    fn detect(&self, image: &DynamicImage) -> Result<DetectionResult, DetectorError> {
        let (_, variance) = Self::luma_stats(image);

        // Natural video sits in a mid-range variance band
        let deviation = if variance < 100.0 {
            (100.0 - variance) / 100.0
        } else if variance > 4000.0 {
            ((variance - 4000.0) / 4000.0).min(1.0)
        } else {
            0.0
        };

        let jitter: f32 = rand::thread_rng().gen_range(-0.05..0.05);
        let confidence = (deviation + jitter).clamp(0.0, 1.0);

        Ok(DetectionResult {
            is_deepfake: confidence > 0.5,
            confidence,
            timestamp: Utc::now(),
            extra: Default::default(),
        })
    }

    fn extract_landmarks(&self, image: &DynamicImage) -> Option<Landmarks> {
        if image.width() < MIN_FACE_SIDE || image.height() < MIN_FACE_SIDE {
            return None;
        }

        let (w, h) = (image.width() as f32, image.height() as f32);
        // Eyes, nose, mouth corners relative to the frame
        let points = vec![
            (w * 0.35, h * 0.40),
            (w * 0.65, h * 0.40),
            (w * 0.50, h * 0.55),
            (w * 0.38, h * 0.70),
            (w * 0.62, h * 0.70),
        ];

        Some(Landmarks { points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowDetector;

    impl Detector for SlowDetector {
        fn detect(&self, _image: &DynamicImage) -> Result<DetectionResult, DetectorError> {
            std::thread::sleep(Duration::from_millis(200));
            Err(DetectorError::Inference("unreachable".into()))
        }

        fn extract_landmarks(&self, _image: &DynamicImage) -> Option<Landmarks> {
            None
        }
    }

    fn blank_image(side: u32) -> DynamicImage {
        DynamicImage::new_rgb8(side, side)
    }

    #[test]
    fn test_heuristic_confidence_in_range() {
        let detector = HeuristicDetector::new();
        let result = detector.detect(&blank_image(128)).unwrap();

        assert!((0.0..=1.0).contains(&result.confidence));
        // A perfectly flat frame has zero variance and reads synthetic
        assert!(result.is_deepfake);
    }

    #[test]
    fn test_landmarks_absent_for_tiny_image() {
        let detector = HeuristicDetector::new();
        assert!(detector.extract_landmarks(&blank_image(16)).is_none());
        assert!(detector.extract_landmarks(&blank_image(128)).is_some());
    }

    #[tokio::test]
    async fn test_run_detect_times_out() {
        let detector: Arc<dyn Detector> = Arc::new(SlowDetector);
        let result = run_detect(detector, blank_image(32), Duration::from_millis(20)).await;

        assert!(matches!(result, Err(DetectorError::Timeout)));
    }

    #[tokio::test]
    async fn test_run_detect_completes_within_timeout() {
        let detector: Arc<dyn Detector> = Arc::new(HeuristicDetector::new());
        let result = run_detect(detector, blank_image(64), Duration::from_secs(1)).await;

        assert!(result.is_ok());
    }
}
