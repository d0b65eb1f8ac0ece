//! DeepGuard Backend Server
//!
//! Realtime deepfake detection backend: accepts per-frame classification
//! work over HTTP and persistent websocket streams, and aggregates streamed
//! results into per-session verdicts.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     DEEPGUARD BACKEND                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────────┐  ┌─────────────────────┐   │
//! │  │  API      │  │  Stream Loops  │  │  Detector Offload   │   │
//! │  │  Gateway  │  │  (1 task per   │  │  (blocking pool +   │   │
//! │  │  (Axum)   │  │   connection)  │  │   bounded timeout)  │   │
//! │  └─────┬─────┘  └───────┬────────┘  └──────────┬──────────┘   │
//! │        └────────────────┼──────────────────────┘              │
//! │                         ▼                                     │
//! │                ┌─────────────────┐                            │
//! │                │ SessionRegistry │                            │
//! │                │  (in-memory)    │                            │
//! │                └─────────────────┘                            │
//! └───────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod detector;
mod error;
mod handlers;
mod models;
mod registry;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use detector::{Detector, HeuristicDetector};
use registry::SessionRegistry;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deepguard_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("DeepGuard server starting...");

    // Build application state
    let state = AppState {
        registry: Arc::new(SessionRegistry::new()),
        detector: Arc::new(HeuristicDetector::new()),
        config: config.clone(),
    };

    // Background sweep for closed, idle sessions
    if config.session_ttl_secs > 0 {
        spawn_eviction_task(
            state.registry.clone(),
            Duration::from_secs(config.session_ttl_secs),
        );
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub detector: Arc<dyn Detector>,
    pub config: config::Config,
}

impl AppState {
    pub fn detector_timeout(&self) -> Duration {
        Duration::from_millis(self.config.detector_timeout_ms)
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::check))
        .route("/detect/frame", post(handlers::detect::detect_frame))
        .route("/ws/detect/:session_id", get(handlers::stream::ws_detect))
        .route("/session/:session_id", get(handlers::sessions::get))
        .route("/stats", get(handlers::sessions::stats))
        .route("/calibrate/:user_id", post(handlers::calibrate::calibrate))
        .route("/train/feedback", post(handlers::feedback::submit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Periodically evict closed sessions idle past the TTL
fn spawn_eviction_task(registry: Arc<SessionRegistry>, ttl: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = registry.evict_idle(ttl);
            if evicted > 0 {
                tracing::debug!("Evicted {} idle sessions", evicted);
            }
        }
    });
}
