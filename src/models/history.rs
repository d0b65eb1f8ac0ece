//! Frame History - bounded retention of per-frame results
//!
//! Fixed-capacity ring buffer of recent detection results. Retention is
//! deliberately separate from the confidence window: the session keeps the
//! last `HISTORY_CAPACITY` results for inspection, while the rolling
//! confidence is computed over a smaller window read via `latest()`.

use std::collections::VecDeque;

use crate::models::DetectionResult;

/// Retained results per session (10 seconds at 30fps)
pub const HISTORY_CAPACITY: usize = 300;

/// Fixed-capacity FIFO of detection results
#[derive(Debug, Clone)]
pub struct FrameHistory {
    buffer: VecDeque<DetectionResult>,
    capacity: usize,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a result, evicting the oldest entry once at capacity
    pub fn push(&mut self, result: DetectionResult) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(result);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Iterate the most recent `n` entries, oldest first.
    ///
    /// Yields fewer than `n` items when the buffer holds fewer.
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &DetectionResult> {
        let skip = self.buffer.len().saturating_sub(n);
        self.buffer.iter().skip(skip)
    }
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(is_deepfake: bool, confidence: f32) -> DetectionResult {
        DetectionResult {
            is_deepfake,
            confidence,
            timestamp: Utc::now(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_push_within_capacity() {
        let mut history = FrameHistory::new(5);
        for i in 0..3 {
            history.push(result(false, i as f32 * 0.1));
        }
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut history = FrameHistory::new(3);
        for i in 0..5 {
            history.push(result(true, i as f32));
        }

        assert_eq!(history.len(), 3);
        let confidences: Vec<f32> = history.latest(3).map(|r| r.confidence).collect();
        assert_eq!(confidences, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_latest_window_smaller_than_buffer() {
        let mut history = FrameHistory::new(10);
        for i in 0..10 {
            history.push(result(i % 2 == 0, i as f32));
        }

        let window: Vec<f32> = history.latest(4).map(|r| r.confidence).collect();
        assert_eq!(window, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_latest_underfilled() {
        let mut history = FrameHistory::new(10);
        history.push(result(true, 0.9));

        assert_eq!(history.latest(4).count(), 1);
    }
}
