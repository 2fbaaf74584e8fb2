//! Rendered UI state of the login form

use crate::models::{Decision, Meter, RiskReading, Tone};

pub const MSG_IDLE: &str = "Move the cursor and focus the form to begin.";
pub const MSG_CAPTURING: &str = "Capturing mouse dynamics...";
pub const MSG_NEED_SIGNAL: &str = "Move your mouse a bit more...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub tone: Tone,
}

impl Label {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self { text: text.into(), tone }
    }
}

/// Everything the page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub status: Label,
    pub badge: Label,
    /// Empty text when no hint is shown
    pub hint: Label,
    pub score: Meter,
    pub confidence: Meter,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            status: Label::new(MSG_IDLE, Tone::Muted),
            badge: Label::new("No signal yet", Tone::Muted),
            hint: Label::new("", Tone::Muted),
            score: Meter::default(),
            confidence: Meter::default(),
        }
    }
}

impl ViewState {
    pub fn set_status(&mut self, text: impl Into<String>, tone: Tone) {
        self.status = Label::new(text, tone);
    }

    /// Meters, badge and hint for the given reading
    pub fn render_reading(&mut self, risk: &RiskReading, decision: Decision) {
        self.score = Meter::from_value(risk.score);
        self.confidence = Meter::from_value(risk.confidence);
        self.badge = Label::new(decision.badge_label(), decision.tone());
        self.hint = match decision {
            Decision::WarnLowConfidence => Label::new(MSG_NEED_SIGNAL, Tone::Warn),
            _ => Label::new("", Tone::Muted),
        };
    }

    /// Status line for a submit decision
    pub fn render_decision(&mut self, decision: Decision) {
        self.set_status(decision.status_message(), decision.tone());
    }
}
