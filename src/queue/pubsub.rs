//! Google Pub/Sub REST publisher

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PublishError, Publisher};
use crate::config::Config;

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Debug, Serialize)]
struct PubsubMessage {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Publishes JSON messages through `topics.publish`
pub struct PubSubPublisher {
    endpoint: String,
    project: Option<String>,
    access_token: Option<String>,
    http_client: reqwest::Client,
}

impl PubSubPublisher {
    pub fn new(
        endpoint: impl Into<String>,
        project: Option<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Network(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project,
            access_token,
            http_client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, PublishError> {
        Self::new(
            config.pubsub_endpoint.clone(),
            config.pubsub_project.clone(),
            config.pubsub_access_token.clone(),
            Duration::from_secs(config.pubsub_timeout_secs),
        )
    }

    /// Fully qualified topic path (`projects/{p}/topics/{t}`)
    pub fn topic_path(&self, topic: &str) -> String {
        if topic.starts_with("projects/") {
            return topic.to_string();
        }
        match &self.project {
            Some(project) => format!("projects/{}/topics/{}", project, topic),
            None => topic.to_string(),
        }
    }

    fn publish_url(&self, topic: &str) -> String {
        format!("{}/v1/{}:publish", self.endpoint, self.topic_path(topic))
    }
}

#[async_trait]
impl Publisher for PubSubPublisher {
    fn name(&self) -> &str {
        "pubsub"
    }

    async fn publish(&self, topic: &str, message: &Value) -> Result<String, PublishError> {
        let payload = serde_json::to_vec(message)?;
        let request = PublishRequest {
            messages: vec![PubsubMessage { data: BASE64.encode(payload) }],
        };

        let mut builder = self.http_client.post(self.publish_url(topic)).json(&request);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected { status, body });
        }

        let ack: PublishResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        ack.message_ids
            .into_iter()
            .next()
            .ok_or(PublishError::MissingAck)
    }
}
