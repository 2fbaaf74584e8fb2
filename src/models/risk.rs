//! Risk reading and decision tiers

use serde::{Deserialize, Serialize};

/// Latest (score, confidence) pair reported by the signal source.
///
/// Values are expected in `[0, 1]` but nothing enforces it. Threshold
/// comparisons use the raw values; only [`Meter`] clamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReading {
    pub score: f64,
    pub confidence: f64,
}

/// Reading as pushed by the signal source, fields possibly absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct RawRisk {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl RiskReading {
    pub fn new(score: f64, confidence: f64) -> Self {
        Self { score, confidence }
    }

    /// Coerce a raw reading: missing or NaN fields become 0
    pub fn from_raw(raw: RawRisk) -> Self {
        Self {
            score: coerce(raw.score),
            confidence: coerce(raw.confidence),
        }
    }
}

impl From<RawRisk> for RiskReading {
    fn from(raw: RawRisk) -> Self {
        Self::from_raw(raw)
    }
}

fn coerce(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

/// Fixed decision thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Below this confidence nothing else is evaluated
    pub confidence_min: f64,
    pub block_score: f64,
    pub block_confidence: f64,
    pub warn_score: f64,
    pub warn_confidence: f64,
}

impl Thresholds {
    pub const DEFAULT: Thresholds = Thresholds {
        confidence_min: 0.6,
        block_score: 0.75,
        block_confidence: 0.8,
        warn_score: 0.55,
        warn_confidence: 0.6,
    };

    /// Classify a reading. First match wins, low confidence overrides any score.
    pub fn classify(&self, risk: &RiskReading) -> Decision {
        if risk.confidence < self.confidence_min {
            Decision::WarnLowConfidence
        } else if risk.score >= self.block_score && risk.confidence >= self.block_confidence {
            Decision::Block
        } else if risk.score >= self.warn_score && risk.confidence >= self.warn_confidence {
            Decision::WarnElevated
        } else {
            Decision::Allow
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Decision tier derived from a reading. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Block,
    WarnElevated,
    WarnLowConfidence,
    Allow,
}

/// Visual tone used by status, badge and hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Muted,
    Ok,
    Warn,
    Block,
}

impl Decision {
    /// Classify with [`Thresholds::DEFAULT`]
    pub fn classify(risk: &RiskReading) -> Self {
        Thresholds::DEFAULT.classify(risk)
    }

    pub fn tone(&self) -> Tone {
        match self {
            Decision::Block => Tone::Block,
            Decision::WarnElevated | Decision::WarnLowConfidence => Tone::Warn,
            Decision::Allow => Tone::Ok,
        }
    }

    /// Status line shown after a submit
    pub fn status_message(&self) -> &'static str {
        match self {
            Decision::WarnLowConfidence => "Need more pointer signal before deciding.",
            Decision::Block => "Access blocked: anomalous mouse dynamics.",
            Decision::WarnElevated => "Warning: elevated risk detected, step-up verification advised.",
            Decision::Allow => "Access granted: mouse dynamics look good.",
        }
    }

    /// Short badge label
    pub fn badge_label(&self) -> &'static str {
        match self {
            Decision::WarnLowConfidence => "Low confidence",
            Decision::Block => "High risk",
            Decision::WarnElevated => "Elevated risk",
            Decision::Allow => "Low risk",
        }
    }
}

/// Meter rendering of one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meter {
    /// Bar width, clamped to 0..=100
    pub width_pct: u8,
    /// Raw value to three decimals
    pub display: String,
}

impl Meter {
    pub fn from_value(value: f64) -> Self {
        let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        Self {
            width_pct: (clamped * 100.0).round() as u8,
            display: format!("{:.3}", value),
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::from_value(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_confidence_dominates() {
        for score in [-1.0, 0.0, 0.5, 0.9, 1.0, 5.0] {
            for confidence in [0.0, 0.3, 0.59, 0.5999] {
                let risk = RiskReading::new(score, confidence);
                assert_eq!(Decision::classify(&risk), Decision::WarnLowConfidence);
            }
        }
        assert_eq!(
            Decision::classify(&RiskReading::new(0.9, 0.5)),
            Decision::WarnLowConfidence
        );
    }

    #[test]
    fn test_block_region() {
        for score in [0.75, 0.8, 1.0, 1.5] {
            for confidence in [0.8, 0.95, 1.0] {
                let risk = RiskReading::new(score, confidence);
                assert_eq!(Decision::classify(&risk), Decision::Block);
            }
        }
    }

    #[test]
    fn test_elevated_and_allow() {
        assert_eq!(Decision::classify(&RiskReading::new(0.6, 0.65)), Decision::WarnElevated);
        // High score but confidence short of the block pair
        assert_eq!(Decision::classify(&RiskReading::new(0.9, 0.79)), Decision::WarnElevated);
        assert_eq!(Decision::classify(&RiskReading::new(0.1, 0.9)), Decision::Allow);
        assert_eq!(Decision::classify(&RiskReading::new(0.5499, 0.6)), Decision::Allow);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(Decision::classify(&RiskReading::new(0.55, 0.6)), Decision::WarnElevated);
        assert_eq!(Decision::classify(&RiskReading::new(0.75, 0.8)), Decision::Block);
    }

    #[test]
    fn test_meter_clamps_width_not_display() {
        let low = Meter::from_value(-0.3);
        assert_eq!(low.width_pct, 0);
        assert_eq!(low.display, "-0.300");

        let high = Meter::from_value(1.7);
        assert_eq!(high.width_pct, 100);
        assert_eq!(high.display, "1.700");

        assert_eq!(Meter::from_value(0.456).width_pct, 46);
    }

    #[test]
    fn test_meter_monotonic() {
        let mut last = 0;
        for step in -10..=20 {
            let width = Meter::from_value(step as f64 / 10.0).width_pct;
            assert!(width >= last);
            last = width;
        }
    }

    #[test]
    fn test_raw_coercion() {
        let raw: RawRisk = serde_json::from_str(r#"{"score": 0.4}"#).unwrap();
        assert_eq!(RiskReading::from(raw), RiskReading::new(0.4, 0.0));

        let nan = RawRisk { score: Some(f64::NAN), confidence: Some(0.7) };
        assert_eq!(RiskReading::from(nan), RiskReading::new(0.0, 0.7));
    }

    #[test]
    fn test_decision_rendering() {
        assert_eq!(Decision::Block.tone(), Tone::Block);
        assert_eq!(Decision::WarnLowConfidence.tone(), Tone::Warn);
        assert_eq!(Decision::Allow.badge_label(), "Low risk");
        assert_eq!(
            serde_json::to_value(Decision::WarnLowConfidence).unwrap(),
            serde_json::json!("WARN_LOW_CONFIDENCE")
        );
    }
}
