//! Configuration module

use std::env;
use std::net::{IpAddr, Ipv4Addr};

/// Header carrying the ingest shared secret unless overridden
pub const DEFAULT_TOKEN_HEADER: &str = "x-ingest-token";

/// Header name older clients used for the same secret
pub const LEGACY_TOKEN_HEADER: &str = "ingest_token";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Queue topic; `None` switches /api/store to local logging
    pub pubsub_topic: Option<String>,

    /// Project used to qualify short topic names
    pub pubsub_project: Option<String>,

    /// Pub/Sub REST endpoint
    pub pubsub_endpoint: String,

    /// Bearer token for the Pub/Sub REST API
    pub pubsub_access_token: Option<String>,

    /// Publish timeout in seconds
    pub pubsub_timeout_secs: u64,

    /// Shared ingest secret; `None` leaves the endpoint open
    pub ingest_token: Option<String>,

    /// Header the shared secret is read from
    pub ingest_token_header: String,

    /// Maximum accepted request body
    pub body_limit_bytes: usize,

    /// Maximum JSON nesting depth accepted by the sanitizer
    pub sanitize_max_depth: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            pubsub_topic: None,
            pubsub_project: None,
            pubsub_endpoint: "https://pubsub.googleapis.com".to_string(),
            pubsub_access_token: None,
            pubsub_timeout_secs: 10,
            ingest_token: None,
            ingest_token_header: DEFAULT_TOKEN_HEADER.to_string(),
            body_limit_bytes: 1024 * 1024,
            sanitize_max_depth: 32,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // The emulator speaks plain HTTP and needs no credentials
        let pubsub_endpoint = match non_empty("PUBSUB_EMULATOR_HOST") {
            Some(host) => format!("http://{}", host),
            None => non_empty("PUBSUB_ENDPOINT").unwrap_or(defaults.pubsub_endpoint),
        };

        Self {
            host: env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.host),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            pubsub_topic: non_empty("PUBSUB_TOPIC"),

            pubsub_project: non_empty("PUBSUB_PROJECT")
                .or_else(|| non_empty("GOOGLE_CLOUD_PROJECT")),

            pubsub_endpoint,

            pubsub_access_token: non_empty("PUBSUB_ACCESS_TOKEN"),

            pubsub_timeout_secs: env::var("PUBSUB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pubsub_timeout_secs),

            ingest_token: non_empty("INGEST_TOKEN"),

            ingest_token_header: non_empty("INGEST_TOKEN_HEADER")
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or(defaults.ingest_token_header),

            body_limit_bytes: env::var("BODY_LIMIT_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.body_limit_bytes),

            sanitize_max_depth: env::var("SANITIZE_MAX_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sanitize_max_depth),

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether /api/store requires the shared secret
    pub fn auth_enabled(&self) -> bool {
        self.ingest_token.is_some()
    }
}

/// Read an env var, treating an empty value as unset
fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
