//! Shared-secret middleware for the ingestion endpoint

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::config::LEGACY_TOKEN_HEADER;
use crate::{AppError, AppState};

/// Middleware: require the ingest token when one is configured.
///
/// Runs before the body is read, so a rejected request never reaches
/// parsing or sanitization.
pub async fn require_ingest_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.ingest_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let verdict = match extract_token(req.headers(), &state.config.ingest_token_header) {
        Some(token) if tokens_match(token, expected) => Ok(()),
        Some(_) => Err("token mismatch"),
        None => Err("token missing"),
    };

    match verdict {
        Ok(()) => Ok(next.run(req).await),
        Err(reason) => {
            tracing::warn!("Rejected ingest request: {}", reason);
            Err(AppError::Unauthorized)
        }
    }
}

/// Read the token from the configured header, falling back to the legacy name
fn extract_token<'a>(headers: &'a HeaderMap, header_name: &str) -> Option<&'a str> {
    let read = move |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };
    read(header_name).or_else(|| read(LEGACY_TOKEN_HEADER))
}

/// Compare fixed-size digests without early exit on the first differing byte
fn tokens_match(presented: &str, expected: &str) -> bool {
    let a = hash_token(presented);
    let b = hash_token(expected);
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}
