//! Detection session - per-connection rolling state and alert latch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DetectionResult, FrameHistory};

/// Number of recent results the rolling confidence is computed over
pub const CONFIDENCE_WINDOW: usize = 30;

/// Rolling confidence above this (strictly) raises the one-shot alert
pub const ALERT_THRESHOLD: f32 = 0.7;

/// One-shot notification of sustained deepfake detection.
///
/// Immutable once created; a session raises at most one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: f32,
    pub frame_count: u64,
}

/// Read-only snapshot of a session, safe to take mid-stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Seconds since the session opened
    pub duration: f64,
    pub frame_count: u64,
    pub overall_confidence: f32,
    pub alerts: Vec<Alert>,
    pub is_active: bool,
}

/// Rolling per-connection state for one detection stream.
///
/// Single-writer: only the connection's own receive loop mutates a session.
/// The registry hands out shared references for read-only snapshots.
#[derive(Debug)]
pub struct DetectionSession {
    id: String,
    start_time: DateTime<Utc>,
    frame_count: u64,
    history: FrameHistory,
    rolling_confidence: f32,
    alerts: Vec<Alert>,
    active: bool,
    last_activity: DateTime<Utc>,
}

impl DetectionSession {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            start_time: now,
            frame_count: 0,
            history: FrameHistory::default(),
            rolling_confidence: 0.0,
            alerts: Vec::new(),
            active: true,
            last_activity: now,
        }
    }

    /// Ingest one per-frame result and update the derived verdict.
    ///
    /// The rolling confidence is defined once `CONFIDENCE_WINDOW` results
    /// have been ingested and always covers exactly the most recent window,
    /// independent of how much history is retained. The first strict
    /// crossing of `ALERT_THRESHOLD` latches a single alert; the latch never
    /// re-arms, even if confidence later drops and crosses again.
    pub fn add_result(&mut self, result: DetectionResult) {
        self.frame_count += 1;
        self.last_activity = Utc::now();
        self.history.push(result);

        if self.frame_count >= CONFIDENCE_WINDOW as u64 {
            let deepfake_count = self
                .history
                .latest(CONFIDENCE_WINDOW)
                .filter(|r| r.is_deepfake)
                .count();
            self.rolling_confidence = deepfake_count as f32 / CONFIDENCE_WINDOW as f32;

            if self.rolling_confidence > ALERT_THRESHOLD && self.alerts.is_empty() {
                self.alerts.push(Alert {
                    timestamp: Utc::now(),
                    kind: "sustained_deepfake_detection".to_string(),
                    confidence: self.rolling_confidence,
                    frame_count: self.frame_count,
                });
            }
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            duration: (Utc::now() - self.start_time)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
            frame_count: self.frame_count,
            overall_confidence: self.rolling_confidence,
            alerts: self.alerts.clone(),
            is_active: self.active,
        }
    }

    /// Active -> Closed; terminal and idempotent
    pub fn close(&mut self) {
        self.active = false;
        self.last_activity = Utc::now();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn rolling_confidence(&self) -> f32 {
        self.rolling_confidence
    }

    pub fn latest_alert(&self) -> Option<&Alert> {
        self.alerts.last()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[cfg(test)]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
