//! Client decision engine
//!
//! Owns the latest risk reading and the rendered view. On submit it
//! flushes the signal source, classifies the reading, renders the decision
//! and dispatches exactly one [`EventBatch`], whatever the decision.
//!
//! ```text
//! Idle ──focus──▶ Capturing ──submit──▶ Capturing
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::dispatch::{Delivery, Dispatcher};
use super::signal::SignalSource;
use super::view::{ViewState, MSG_CAPTURING};
use crate::models::{
    Decision, EventBatch, LoginAttemptEvent, RawRisk, RiskReading, Thresholds, Tone,
    DEFAULT_LABEL, DEFAULT_SOURCE,
};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// `label` of every emitted event
    pub label: String,
    /// `source` of every emitted batch
    pub source: String,
    /// Upper bound on the pre-decision flush
    pub flush_timeout: Duration,
    pub thresholds: Thresholds,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            flush_timeout: Duration::from_millis(1500),
            thresholds: Thresholds::DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    /// Sticky once entered
    Capturing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub decision: Decision,
    pub reading: RiskReading,
    pub batch_id: String,
    pub delivery: Delivery,
}

pub struct DecisionEngine {
    source: Arc<dyn SignalSource>,
    dispatcher: Dispatcher,
    options: EngineOptions,
    last_risk: RiskReading,
    capture: CaptureState,
    view: ViewState,
}

impl DecisionEngine {
    pub fn new(source: Arc<dyn SignalSource>, dispatcher: Dispatcher) -> Self {
        Self::with_options(source, dispatcher, EngineOptions::default())
    }

    pub fn with_options(
        source: Arc<dyn SignalSource>,
        dispatcher: Dispatcher,
        options: EngineOptions,
    ) -> Self {
        Self {
            source,
            dispatcher,
            options,
            last_risk: RiskReading::default(),
            capture: CaptureState::Idle,
            view: ViewState::default(),
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn last_risk(&self) -> RiskReading {
        self.last_risk
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    /// New reading pushed by the signal source
    pub fn on_signal_update(&mut self, raw: RawRisk) {
        self.last_risk = RiskReading::from(raw);
        self.render_reading();
    }

    /// Start capture on first input focus; later calls do nothing
    pub fn ensure_capture_started(&mut self) {
        if self.capture == CaptureState::Capturing {
            return;
        }
        self.capture = CaptureState::Capturing;

        if let Some(Err(e)) = self.source.start() {
            tracing::error!("Signal start failed: {}", e);
        }
        self.view.set_status(MSG_CAPTURING, Tone::Muted);
    }

    /// Decide on a login attempt and report it
    pub async fn handle_submit(&mut self) -> SubmitOutcome {
        self.ensure_capture_started();
        self.flush_bounded().await;

        // Prefer a fresh pull over the last pushed value
        if let Some(raw) = self.source.risk() {
            self.last_risk = RiskReading::from(raw);
        }
        let reading = self.last_risk;
        self.render_reading();

        let decision = self.options.thresholds.classify(&reading);
        self.view.render_decision(decision);

        let event = LoginAttemptEvent::new(self.options.label.clone(), reading, Utc::now());
        let batch = EventBatch::single(self.options.source.clone(), event);
        let delivery = self.dispatcher.send_batch(&batch);

        tracing::debug!(
            batch_id = %batch.batch_id,
            ?decision,
            ?delivery,
            score = reading.score,
            confidence = reading.confidence,
            "Login attempt evaluated"
        );

        SubmitOutcome {
            decision,
            reading,
            batch_id: batch.batch_id,
            delivery,
        }
    }

    /// Best-effort flush when the page goes away. Never waits.
    pub fn flush_on_unload(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, skipping unload flush");
            return;
        };
        let source = Arc::clone(&self.source);
        handle.spawn(async move {
            if let Some(Err(e)) = source.flush().await {
                tracing::error!("Flush before unload failed: {}", e);
            }
        });
    }

    /// End of lifecycle
    pub fn teardown(self) {
        self.flush_on_unload();
    }

    async fn flush_bounded(&self) {
        match tokio::time::timeout(self.options.flush_timeout, self.source.flush()).await {
            Ok(Some(Err(e))) => tracing::error!("Flush failed: {}", e),
            Err(_) => tracing::warn!("Flush timed out after {:?}", self.options.flush_timeout),
            Ok(_) => {}
        }
    }

    fn render_reading(&mut self) {
        let decision = self.options.thresholds.classify(&self.last_risk);
        self.view.render_reading(&self.last_risk, decision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::dispatch::{BeaconTransport, DispatchError, RequestTransport};
    use crate::client::signal::{NullSignalSource, SignalError};
    use crate::client::view::MSG_IDLE;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBeacon {
        bodies: Mutex<Vec<String>>,
    }

    impl BeaconTransport for RecordingBeacon {
        fn send_beacon(&self, _url: &str, body: String) -> bool {
            self.bodies.lock().unwrap().push(body);
            true
        }
    }

    struct UnusedRequest;

    #[async_trait]
    impl RequestTransport for UnusedRequest {
        async fn post_json(&self, _url: &str, _body: String) -> Result<(), DispatchError> {
            panic!("beacon should have accepted the batch");
        }
    }

    #[derive(Default)]
    struct MockSource {
        starts: AtomicUsize,
        flushes: AtomicUsize,
        fail_start: bool,
        fail_flush: bool,
        hang_flush: bool,
        pulled: Mutex<Option<RawRisk>>,
    }

    #[async_trait]
    impl SignalSource for MockSource {
        fn start(&self) -> Option<Result<(), SignalError>> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                Some(Err(SignalError::Start("no pointer".to_string())))
            } else {
                Some(Ok(()))
            }
        }

        async fn flush(&self) -> Option<Result<(), SignalError>> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            if self.hang_flush {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail_flush {
                Some(Err(SignalError::Flush("scorer offline".to_string())))
            } else {
                Some(Ok(()))
            }
        }

        fn risk(&self) -> Option<RawRisk> {
            *self.pulled.lock().unwrap()
        }
    }

    fn engine(source: Arc<dyn SignalSource>) -> (DecisionEngine, Arc<RecordingBeacon>) {
        let beacon = Arc::new(RecordingBeacon::default());
        let dispatcher = Dispatcher::new("/api/store", Arc::new(UnusedRequest)).with_beacon(beacon.clone());
        let options = EngineOptions {
            flush_timeout: Duration::from_millis(50),
            ..EngineOptions::default()
        };
        (DecisionEngine::with_options(source, dispatcher, options), beacon)
    }

    fn raw(score: f64, confidence: f64) -> RawRisk {
        RawRisk { score: Some(score), confidence: Some(confidence) }
    }

    #[test]
    fn test_initial_state() {
        let (engine, _) = engine(Arc::new(NullSignalSource));
        assert_eq!(engine.capture_state(), CaptureState::Idle);
        assert_eq!(engine.last_risk(), RiskReading::default());
        assert_eq!(engine.view().status.text, MSG_IDLE);
        assert_eq!(engine.view().badge.text, "No signal yet");
    }

    #[test]
    fn test_capture_start_is_idempotent() {
        let source = Arc::new(MockSource::default());
        let (mut engine, _) = engine(source.clone());

        engine.ensure_capture_started();
        engine.ensure_capture_started();

        assert_eq!(source.starts.load(Ordering::SeqCst), 1);
        assert_eq!(engine.capture_state(), CaptureState::Capturing);
        assert_eq!(engine.view().status.text, MSG_CAPTURING);
    }

    #[test]
    fn test_start_failure_does_not_block() {
        let source = Arc::new(MockSource { fail_start: true, ..Default::default() });
        let (mut engine, _) = engine(source);
        engine.ensure_capture_started();
        assert_eq!(engine.capture_state(), CaptureState::Capturing);
    }

    #[test]
    fn test_signal_update_renders_meters() {
        let (mut engine, _) = engine(Arc::new(NullSignalSource));
        engine.on_signal_update(raw(1.7, 0.4));

        let view = engine.view();
        assert_eq!(view.score.width_pct, 100);
        assert_eq!(view.score.display, "1.700");
        assert_eq!(view.badge.text, "Low confidence");
        assert_eq!(view.hint.tone, Tone::Warn);

        engine.on_signal_update(RawRisk { score: Some(0.2), confidence: None });
        assert_eq!(engine.last_risk(), RiskReading::new(0.2, 0.0));
    }

    #[tokio::test]
    async fn test_submit_uses_pushed_reading_and_dispatches_once() {
        let (mut engine, beacon) = engine(Arc::new(NullSignalSource));
        engine.on_signal_update(raw(0.6, 0.65));

        let outcome = engine.handle_submit().await;
        assert_eq!(outcome.decision, Decision::WarnElevated);
        assert_eq!(outcome.delivery, Delivery::Beacon);
        assert_eq!(engine.view().status.tone, Tone::Warn);

        let bodies = beacon.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        let batch: EventBatch = serde_json::from_str(&bodies[0]).unwrap();
        assert_eq!(batch.batch_id, outcome.batch_id);
        assert_eq!(batch.source, DEFAULT_SOURCE);
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.entries[0].event, "login_attempt");
        assert_eq!(batch.entries[0].risk, RiskReading::new(0.6, 0.65));
    }

    #[tokio::test]
    async fn test_submit_prefers_pulled_reading() {
        let source = Arc::new(MockSource::default());
        *source.pulled.lock().unwrap() = Some(raw(0.9, 0.95));
        let (mut engine, _) = engine(source.clone());
        engine.on_signal_update(raw(0.1, 0.9));

        let outcome = engine.handle_submit().await;
        assert_eq!(outcome.decision, Decision::Block);
        assert_eq!(engine.last_risk(), RiskReading::new(0.9, 0.95));
        assert_eq!(engine.view().status.tone, Tone::Block);
        assert_eq!(source.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(source.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_low_confidence_still_dispatches() {
        let (mut engine, beacon) = engine(Arc::new(NullSignalSource));
        engine.on_signal_update(raw(1.0, 0.5));

        let outcome = engine.handle_submit().await;
        assert_eq!(outcome.decision, Decision::WarnLowConfidence);
        assert_eq!(beacon.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_flush_failure_and_timeout_are_swallowed() {
        let failing = Arc::new(MockSource { fail_flush: true, ..Default::default() });
        let (mut engine_a, beacon_a) = engine(failing);
        assert_eq!(engine_a.handle_submit().await.decision, Decision::WarnLowConfidence);
        assert_eq!(beacon_a.bodies.lock().unwrap().len(), 1);

        let hanging = Arc::new(MockSource { hang_flush: true, ..Default::default() });
        let (mut engine_b, beacon_b) = engine(hanging);
        engine_b.on_signal_update(raw(0.1, 0.9));
        assert_eq!(engine_b.handle_submit().await.decision, Decision::Allow);
        assert_eq!(beacon_b.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_submits_send_independent_batches() {
        let (mut engine, beacon) = engine(Arc::new(NullSignalSource));
        let first = engine.handle_submit().await;
        let second = engine.handle_submit().await;
        assert_ne!(first.batch_id, second.batch_id);
        assert_eq!(beacon.bodies.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_teardown_flushes_in_background() {
        let source = Arc::new(MockSource::default());
        let (engine, _) = engine(source.clone());
        engine.teardown();

        for _ in 0..10 {
            if source.flushes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(source.flushes.load(Ordering::SeqCst), 1);
    }
}
