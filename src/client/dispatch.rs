//! Outbound event batch delivery
//!
//! At most one attempt per batch and never blocking the caller. A beacon
//! transport is tried first when available; otherwise (or when the beacon
//! refuses the payload) a detached request is spawned. Failures are logged
//! and dropped: no retry, no queue, no persistence.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::EventBatch;

/// Browser beacon quota; larger payloads are refused
pub const BEACON_MAX_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status {0}")]
    Status(u16),
}

/// Fire-and-forget transport that answers synchronously whether it took the payload
pub trait BeaconTransport: Send + Sync {
    fn send_beacon(&self, url: &str, body: String) -> bool;
}

/// Ordinary asynchronous JSON POST
#[async_trait]
pub trait RequestTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: String) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStrategy {
    BeaconFirst,
    RequestOnly,
}

/// How a batch left the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the beacon transport
    Beacon,
    /// Handed to a detached request task
    Request,
    /// Not sent (serialization failed or no runtime to spawn on)
    Dropped,
}

pub struct Dispatcher {
    url: String,
    beacon: Option<Arc<dyn BeaconTransport>>,
    request: Arc<dyn RequestTransport>,
}

impl Dispatcher {
    pub fn new(url: impl Into<String>, request: Arc<dyn RequestTransport>) -> Self {
        Self {
            url: url.into(),
            beacon: None,
            request,
        }
    }

    pub fn with_beacon(mut self, beacon: Arc<dyn BeaconTransport>) -> Self {
        self.beacon = Some(beacon);
        self
    }

    /// Strategy follows from which transports are present
    pub fn strategy(&self) -> DeliveryStrategy {
        if self.beacon.is_some() {
            DeliveryStrategy::BeaconFirst
        } else {
            DeliveryStrategy::RequestOnly
        }
    }

    /// Send one batch. Returns immediately.
    pub fn send_batch(&self, batch: &EventBatch) -> Delivery {
        let body = match serde_json::to_string(batch) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to serialize batch {}: {}", batch.batch_id, e);
                return Delivery::Dropped;
            }
        };

        if let Some(beacon) = &self.beacon {
            if beacon.send_beacon(&self.url, body.clone()) {
                return Delivery::Beacon;
            }
            tracing::debug!("Beacon refused batch {}, falling back to request", batch.batch_id);
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::error!("No async runtime, batch {} dropped", batch.batch_id);
            return Delivery::Dropped;
        };

        let request = Arc::clone(&self.request);
        let url = self.url.clone();
        let batch_id = batch.batch_id.clone();
        handle.spawn(async move {
            if let Err(e) = request.post_json(&url, body).await {
                tracing::error!("Store failed for batch {}: {}", batch_id, e);
            }
        });

        Delivery::Request
    }
}

/// reqwest-backed request transport
pub struct HttpRequest {
    http_client: reqwest::Client,
    token: Option<(String, String)>,
}

impl HttpRequest {
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Network(e.to_string()))?;
        Ok(Self { http_client, token: None })
    }

    /// Send the ingest shared secret with every request
    pub fn with_token(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.token = Some((header.into(), value.into()));
        self
    }
}

#[async_trait]
impl RequestTransport for HttpRequest {
    async fn post_json(&self, url: &str, body: String) -> Result<(), DispatchError> {
        let mut builder = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some((header, value)) = &self.token {
            builder = builder.header(header.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DispatchError::Status(response.status().as_u16()))
        }
    }
}

/// Beacon-style transport: queues the POST on a detached task and reports
/// acceptance without waiting for the network
pub struct HttpBeacon {
    http_client: reqwest::Client,
    token: Option<(String, String)>,
}

impl HttpBeacon {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client, token: None }
    }

    /// Send the ingest shared secret with every beacon
    pub fn with_token(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.token = Some((header.into(), value.into()));
        self
    }
}

impl BeaconTransport for HttpBeacon {
    fn send_beacon(&self, url: &str, body: String) -> bool {
        if body.len() > BEACON_MAX_BYTES {
            return false;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return false;
        };

        let mut request = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some((header, value)) = &self.token {
            request = request.header(header.as_str(), value.as_str());
        }
        handle.spawn(async move {
            // Beacons carry no feedback to the page
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!("Beacon rejected with status {}", response.status());
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Beacon delivery failed: {}", e),
            }
        });
        true
    }
}
