//! Login attempt event batch

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RiskReading;

pub const LOGIN_ATTEMPT_EVENT: &str = "login_attempt";
pub const DEFAULT_LABEL: &str = "login_flow_test";
pub const DEFAULT_SOURCE: &str = "frontend/login_demo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginAttemptEvent {
    pub event: String,
    pub label: String,
    pub risk: RiskReading,
    /// RFC 3339, UTC, millisecond precision
    pub timestamp: String,
}

impl LoginAttemptEvent {
    pub fn new(label: impl Into<String>, risk: RiskReading, at: DateTime<Utc>) -> Self {
        Self {
            event: LOGIN_ATTEMPT_EVENT.to_string(),
            label: label.into(),
            risk,
            timestamp: iso_timestamp(at),
        }
    }
}

/// One outbound batch per submit attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    pub batch_id: String,
    pub source: String,
    pub entries: Vec<LoginAttemptEvent>,
}

impl EventBatch {
    /// New batch with a fresh v4 id
    pub fn new(source: impl Into<String>, entries: Vec<LoginAttemptEvent>) -> Self {
        Self {
            batch_id: Uuid::new_v4().to_string(),
            source: source.into(),
            entries,
        }
    }

    pub fn single(source: impl Into<String>, event: LoginAttemptEvent) -> Self {
        Self::new(source, vec![event])
    }
}

/// ISO-8601 timestamp as emitted by both client and gateway
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_batch_wire_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = LoginAttemptEvent::new(DEFAULT_LABEL, RiskReading::new(0.25, 0.5), at);
        let mut batch = EventBatch::single(DEFAULT_SOURCE, event);
        batch.batch_id = "b-1".to_string();

        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!({
                "batchId": "b-1",
                "source": "frontend/login_demo",
                "entries": [{
                    "event": "login_attempt",
                    "label": "login_flow_test",
                    "risk": { "score": 0.25, "confidence": 0.5 },
                    "timestamp": "2024-05-01T12:00:00.000Z"
                }]
            })
        );
    }

    #[test]
    fn test_batch_ids_unique() {
        let a = EventBatch::new(DEFAULT_SOURCE, vec![]);
        let b = EventBatch::new(DEFAULT_SOURCE, vec![]);
        assert_ne!(a.batch_id, b.batch_id);
    }
}
