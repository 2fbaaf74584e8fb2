//! Risk-gated login demo
//!
//! Two loosely coupled halves joined by one HTTP call:
//!
//! ```text
//! ┌──────────────────────────┐          ┌──────────────────────────────┐
//! │  Client Decision Engine  │  POST    │  Ingestion Gateway (Axum)    │
//! │  signal → decision →     │ ───────▶ │  auth → validate → redact →  │
//! │  render + EventBatch     │ /api/    │  enrich → publish | log      │
//! └──────────────────────────┘  store   └──────────────┬───────────────┘
//!                                                      ▼
//!                                              ┌──────────────┐
//!                                              │   Pub/Sub    │
//!                                              └──────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod sanitize;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use queue::{PublishError, Publisher};

/// Configured queue: topic plus the publisher that reaches it
#[derive(Clone)]
pub struct Queue {
    pub topic: String,
    pub publisher: Arc<dyn Publisher>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` means degraded mode: batches are logged, not published
    pub queue: Option<Queue>,
}

impl AppState {
    /// The queue is enabled only when both a topic and a publisher exist
    pub fn new(config: Config, publisher: Option<Arc<dyn Publisher>>) -> Self {
        let queue = match (config.pubsub_topic.clone(), publisher) {
            (Some(topic), Some(publisher)) => Some(Queue { topic, publisher }),
            _ => None,
        };
        Self { config, queue }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let ingest_routes = Router::new()
        .route("/api/store", post(handlers::store::store))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_ingest_token,
        ));

    let public_routes = Router::new()
        .route("/healthz", get(handlers::health::check))
        .route("/api/data", get(handlers::data::query));

    Router::new()
        .merge(public_routes)
        .merge(ingest_routes)
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
