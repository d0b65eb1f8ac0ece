//! Session registry - process-wide store of detection sessions
//!
//! Injected rather than global: the registry is owned by `AppState` and
//! shared by handle. Individual sessions stay single-writer (only their own
//! connection loop mutates them); the registry's own map is guarded for
//! concurrent insert, lookup, and snapshot iteration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::models::{DetectionSession, SessionSummary, ALERT_THRESHOLD};

pub type SharedSession = Arc<RwLock<DetectionSession>>;

/// Aggregate counters derived live from the registered sessions
#[derive(Debug, Serialize)]
pub struct RegistryStats {
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub total_frames_processed: u64,
    pub high_confidence_detections: usize,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh session under `id`.
    ///
    /// Re-registering an id replaces the previous entry (last-writer-wins);
    /// a client reconnecting with the same id starts over.
    pub fn create(&self, id: &str) -> SharedSession {
        let session = Arc::new(RwLock::new(DetectionSession::new(id)));
        self.sessions
            .write()
            .insert(id.to_string(), session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<SharedSession> {
        self.sessions.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Best-effort snapshot of every session's summary.
    ///
    /// The map lock is held only to clone handles; each session is then read
    /// individually, so summaries taken mid-mutation reflect then-current
    /// values without any cross-session consistency guarantee.
    pub fn snapshot_summaries(&self) -> Vec<SessionSummary> {
        let handles: Vec<SharedSession> = self.sessions.read().values().cloned().collect();
        handles.iter().map(|s| s.read().summary()).collect()
    }

    /// Derive aggregate stats at query time (nothing is cached)
    pub fn stats(&self) -> RegistryStats {
        let summaries = self.snapshot_summaries();

        RegistryStats {
            total_sessions: summaries.len(),
            active_sessions: summaries.iter().filter(|s| s.is_active).count(),
            total_frames_processed: summaries.iter().map(|s| s.frame_count).sum(),
            high_confidence_detections: summaries
                .iter()
                .filter(|s| s.overall_confidence > ALERT_THRESHOLD)
                .count(),
        }
    }

    /// Drop closed sessions idle for at least `ttl`.
    ///
    /// Active sessions are never evicted. Returns the number removed.
    /// Evicted sessions disappear from `/stats` and `/session/{id}`.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();

        sessions.retain(|_, handle| {
            let session = handle.read();
            if session.is_active() {
                return true;
            }
            let idle = (now - session.last_activity())
                .to_std()
                .unwrap_or(Duration::ZERO);
            idle < ttl
        });

        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectionResult;

    fn deepfake_result() -> DetectionResult {
        DetectionResult {
            is_deepfake: true,
            confidence: 0.95,
            timestamp: Utc::now(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_create_get_remove() {
        let registry = SessionRegistry::new();
        registry.create("a");

        assert!(registry.get("a").is_some());
        assert!(registry.get("b").is_none());
        assert!(registry.remove("a").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_overwrites_existing_id() {
        let registry = SessionRegistry::new();
        let first = registry.create("a");
        first.write().add_result(deepfake_result());

        let second = registry.create("a");
        assert_eq!(registry.len(), 1);
        assert_eq!(second.read().frame_count(), 0);
        // The old handle is detached from the registry but still usable
        assert_eq!(first.read().frame_count(), 1);
    }

    #[test]
    fn test_stats_invariants() {
        let registry = SessionRegistry::new();
        let a = registry.create("a");
        let b = registry.create("b");

        for _ in 0..30 {
            a.write().add_result(deepfake_result());
        }
        b.write().close();

        let stats = registry.stats();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.active_sessions, 1);
        assert!(stats.active_sessions <= stats.total_sessions);
        assert_eq!(stats.total_frames_processed, 30);
        // Session "a" sits at confidence 1.0 right now
        assert_eq!(stats.high_confidence_detections, 1);
    }

    #[test]
    fn test_stats_confidence_is_live() {
        let registry = SessionRegistry::new();
        let a = registry.create("a");

        for _ in 0..30 {
            a.write().add_result(deepfake_result());
        }
        assert_eq!(registry.stats().high_confidence_detections, 1);

        // Push the window back below the threshold
        for _ in 0..30 {
            a.write().add_result(DetectionResult {
                is_deepfake: false,
                confidence: 0.1,
                timestamp: Utc::now(),
                extra: Default::default(),
            });
        }
        assert_eq!(registry.stats().high_confidence_detections, 0);
    }

    #[test]
    fn test_evict_skips_active_sessions() {
        let registry = SessionRegistry::new();
        registry.create("open");
        registry.create("done").write().close();

        let evicted = registry.evict_idle(Duration::ZERO);
        assert_eq!(evicted, 1);
        assert!(registry.get("open").is_some());
        assert!(registry.get("done").is_none());
    }

    #[test]
    fn test_evict_respects_ttl() {
        let registry = SessionRegistry::new();
        registry.create("done").write().close();

        // Closed just now, well within a generous TTL
        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);
        assert!(registry.get("done").is_some());
    }

    #[test]
    fn test_snapshot_summaries() {
        let registry = SessionRegistry::new();
        registry.create("a");
        registry.create("b");

        let summaries = registry.snapshot_summaries();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.is_active));
    }
}
