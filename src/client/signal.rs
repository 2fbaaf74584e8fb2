//! Risk signal source capability
//!
//! The source is opaque. Each capability is optional and reports `None`
//! when the source does not provide it, so callers never need to probe
//! the concrete type.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RawRisk;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Signal source failed to start: {0}")]
    Start(String),

    #[error("Signal flush failed: {0}")]
    Flush(String),
}

#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Begin capturing telemetry
    fn start(&self) -> Option<Result<(), SignalError>> {
        None
    }

    /// Push any buffered telemetry through the scorer
    async fn flush(&self) -> Option<Result<(), SignalError>> {
        None
    }

    /// Pull the current reading. `None` when unsupported or nothing is ready.
    fn risk(&self) -> Option<RawRisk> {
        None
    }
}

/// Source with no capabilities; the engine then relies on pushed readings only
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSignalSource;

impl SignalSource for NullSignalSource {}
