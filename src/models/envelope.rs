//! Ingestion envelope: sanitized batch plus server-observed metadata

use std::net::SocketAddr;

use axum::http::{header::USER_AGENT, HeaderMap};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::batch::iso_timestamp;
use crate::sanitize;
use crate::{AppError, AppResult};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Request metadata attached to every envelope
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub received_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl RequestMeta {
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            received_at: Utc::now(),
            user_agent: headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .filter(|ua| !ua.is_empty())
                .map(str::to_string),
            ip: client_ip(headers, peer),
        }
    }
}

/// First X-Forwarded-For hop, else the socket peer
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match forwarded {
        Some(ip) => Some(ip.to_string()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}

/// Sanitized, enriched batch ready for publication
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionEnvelope(Map<String, Value>);

impl IngestionEnvelope {
    /// Validate, redact and enrich a client body.
    ///
    /// The body must be an object with a non-empty `entries` array.
    pub fn build(body: Value, meta: RequestMeta, max_depth: usize) -> AppResult<Self> {
        validate(&body)?;

        let mut map = match sanitize::strip_sensitive(body, max_depth)? {
            Value::Object(map) => map,
            _ => return Err(AppError::InternalError("sanitized body is not an object".to_string())),
        };

        map.insert("_receivedAt".to_string(), Value::String(iso_timestamp(meta.received_at)));
        map.insert("_ua".to_string(), meta.user_agent.map_or(Value::Null, Value::String));
        map.insert("_ip".to_string(), meta.ip.map_or(Value::Null, Value::String));

        Ok(Self(map))
    }

    pub fn batch_id(&self) -> Option<&str> {
        self.0.get("batchId").and_then(Value::as_str)
    }

    pub fn entry_count(&self) -> usize {
        self.0
            .get("entries")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn validate(body: &Value) -> AppResult<()> {
    let object = body
        .as_object()
        .ok_or_else(|| AppError::ValidationError("Body must be a JSON object".to_string()))?;

    match object.get("entries").and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => Ok(()),
        _ => Err(AppError::ValidationError(
            "Body must contain a non-empty entries array".to_string(),
        )),
    }
}
