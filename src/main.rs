//! Ingestion gateway server
//!
//! Boots the `/api/store` endpoint. Configuration comes from the
//! environment (optionally a `.env` file); see [`riskgate::Config`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskgate::{queue::PubSubPublisher, AppState, Config, Publisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "riskgate=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = Config::from_env();
    tracing::info!("Ingestion gateway starting ({})", config.environment);

    let publisher: Option<Arc<dyn Publisher>> = match &config.pubsub_topic {
        Some(topic) => {
            let publisher = PubSubPublisher::from_config(&config)
                .context("Failed to create Pub/Sub publisher")?;
            tracing::info!("Publishing to {}", publisher.topic_path(topic));
            Some(Arc::new(publisher) as Arc<dyn Publisher>)
        }
        None => {
            tracing::warn!("PUBSUB_TOPIC not set. /api/store will log instead of publishing.");
            None
        }
    };

    if !config.auth_enabled() {
        if config.is_production() {
            tracing::error!("INGEST_TOKEN not set in production: /api/store is open");
        } else {
            tracing::warn!("INGEST_TOKEN not set: /api/store accepts unauthenticated requests");
        }
    }

    let addr = SocketAddr::new(config.host, config.port);
    let app = riskgate::create_router(AppState::new(config, publisher));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Ingestion API listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Ingestion gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
