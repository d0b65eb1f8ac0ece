//! Configuration module

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Per-invocation detector timeout in milliseconds
    pub detector_timeout_ms: u64,

    /// Seconds a closed session may sit idle before the registry evicts it.
    /// 0 disables eviction (sessions are retained forever).
    pub session_ttl_secs: u64,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            detector_timeout_ms: env::var("DETECTOR_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(5000),

            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(3600),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
