//! Decision Types
//!
//! Core types cho decision records.
//! KHÔNG chứa logic - chỉ data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sensors::Reading;

// ============================================================================
// WATERING VERDICT
// ============================================================================

/// Predictor output: recommendation plus confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WateringVerdict {
    /// Recommendation to water immediately
    pub water_now: bool,
    /// Positive-class probability from the classifier, 0.0 - 1.0
    pub confidence: f32,
    /// Estimated next watering time (unix seconds); None in degraded mode
    pub next_watering: Option<f64>,
    /// "onnx", "bootstrap" or "degraded"
    pub method: PredictionMethod,
}

impl WateringVerdict {
    /// Documented fallback when the classifier is unavailable.
    /// Distinguishable from a real prediction via `method`.
    pub fn degraded() -> Self {
        Self {
            water_now: false,
            confidence: 0.0,
            next_watering: None,
            method: PredictionMethod::Degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.method == PredictionMethod::Degraded
    }
}

/// How a verdict was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionMethod {
    /// Native ONNX model
    Onnx,
    /// Bootstrap logistic model trained at startup
    Bootstrap,
    /// Classifier unavailable - documented fallback values
    Degraded,
}

impl PredictionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMethod::Onnx => "onnx",
            PredictionMethod::Bootstrap => "bootstrap",
            PredictionMethod::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for PredictionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ACTUATION
// ============================================================================

/// Physical actions the gate can certify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuationKind {
    /// Run the water pump
    Water,
    /// Toggle the grow light
    Light,
}

impl ActuationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActuationKind::Water => "water",
            ActuationKind::Light => "light",
        }
    }
}

/// Safety gate outcome: eligibility to *start* an actuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub approved: bool,
    pub reason: String,
}

impl GateOutcome {
    pub fn approved(reason: &str) -> Self {
        Self {
            approved: true,
            reason: reason.to_string(),
        }
    }

    pub fn denied(reason: &str) -> Self {
        Self {
            approved: false,
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// DECISION RECORD
// ============================================================================

/// One complete pipeline result. Created exactly once per invocation,
/// immutable after creation, appended to the history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: Uuid,
    /// Unix seconds, copied from the reading
    pub timestamp: f64,
    pub reading: Reading,
    pub health_score: f64,
    pub watering_verdict: WateringVerdict,
    pub anomaly_flag: bool,
    pub actuation_authorized: bool,
}

impl DecisionRecord {
    /// Serialize to a single JSONL line
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
