//! Health check handler

use axum::http::StatusCode;

/// Liveness probe, no dependency checks
pub async fn check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
