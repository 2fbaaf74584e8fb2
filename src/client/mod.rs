//! Client decision engine
//!
//! Turns (score, confidence) readings from an opaque signal source into an
//! allow / warn / block decision and reports each login attempt to the
//! ingestion gateway.

pub mod dispatch;
pub mod engine;
pub mod signal;
pub mod view;

pub use dispatch::{
    BeaconTransport, Delivery, DeliveryStrategy, DispatchError, Dispatcher, HttpBeacon,
    HttpRequest, RequestTransport,
};
pub use engine::{CaptureState, DecisionEngine, EngineOptions, SubmitOutcome};
pub use signal::{NullSignalSource, SignalError, SignalSource};
pub use view::{Label, ViewState};
