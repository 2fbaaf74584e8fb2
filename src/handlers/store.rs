//! Event batch ingestion handler

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::models::{IngestionEnvelope, RequestMeta};
use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub status: &'static str,
}

/// Accept one event batch: validate, redact, enrich, then publish.
///
/// Without a configured queue the envelope is logged and still accepted.
/// Publish failures are not retried. Duplicate batch ids are not detected.
pub async fn store(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<StoreResponse>)> {
    let body: Value = serde_json::from_slice(&body)?;
    let meta = RequestMeta::from_request(&headers, peer.map(|ConnectInfo(addr)| addr));
    let envelope = IngestionEnvelope::build(body, meta, state.config.sanitize_max_depth)?;

    let batch_id = envelope.batch_id().unwrap_or("-").to_string();
    let entries = envelope.entry_count();

    let Some(queue) = state.queue.as_ref() else {
        tracing::info!(
            batch_id = %batch_id,
            entries,
            envelope = %envelope.into_value(),
            "Queue disabled, batch logged locally"
        );
        return Ok((StatusCode::ACCEPTED, Json(StoreResponse { status: "received" })));
    };

    let message_id = queue
        .publisher
        .publish(&queue.topic, &envelope.into_value())
        .await?;

    tracing::debug!(
        batch_id = %batch_id,
        entries,
        message_id = %message_id,
        "Batch published to {}", queue.publisher.name()
    );

    Ok((StatusCode::ACCEPTED, Json(StoreResponse { status: "queued" })))
}
