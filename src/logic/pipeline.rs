//! Decision Pipeline
//!
//! Orchestration only: validate → score → predict → observe → gate →
//! record. Không có business logic mới ở đây ngoài sequencing.
//!
//! The engine owns every piece of mutable state (window, safety state,
//! history) behind its own locks - no module-wide statics. Lock order is
//! fixed: window → safety → history.

use std::sync::mpsc::Sender;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use uuid::Uuid;

use super::anomaly::{AnomalyDetector, WindowStatus};
use super::config::EngineConfig;
use super::decision::{ActuationKind, DecisionRecord, GateOutcome};
use super::health;
use super::history::{HistoryLog, HistoryStats};
use super::model::{WateringClassifier, WateringPredictor};
use super::safety::{self, SafetyLimits, SafetyState};
use super::sensors::{Reading, ReadingError};

// ============================================================================
// STATUS
// ============================================================================

/// Engine status for the dashboard/status API
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub model_type: String,
    pub onnx_loaded: bool,
    pub water_confidence_threshold: f32,
    pub window: WindowStatus,
    pub history: HistoryStats,
    pub last_watering_time: f64,
}

// ============================================================================
// ENGINE
// ============================================================================

/// The sensor-to-actuation decision pipeline.
///
/// One instance per monitored plant; safe to share behind `Arc` across
/// the gateway's request handlers.
pub struct DecisionEngine {
    config: EngineConfig,
    predictor: WateringPredictor,
    limits: SafetyLimits,
    detector: Mutex<AnomalyDetector>,
    safety: Mutex<SafetyState>,
    history: RwLock<HistoryLog>,
    persist: Option<Sender<DecisionRecord>>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig, classifier: WateringClassifier) -> Self {
        let predictor = WateringPredictor::new(classifier, config.water_confidence_threshold);
        let limits = SafetyLimits {
            min_watering_interval_secs: config.min_watering_interval_secs,
            max_pump_time_secs: config.max_pump_time_secs,
            max_daily_watering_secs: config.max_daily_watering_secs,
        };

        Self {
            detector: Mutex::new(AnomalyDetector::new(
                config.anomaly_window_size,
                config.anomaly_min_samples,
            )),
            safety: Mutex::new(SafetyState::default()),
            history: RwLock::new(HistoryLog::new(config.history_capacity)),
            predictor,
            limits,
            config,
            persist: None,
        }
    }

    /// Attach the persistence channel (fire-and-forget writes)
    pub fn with_persistence(mut self, sender: Sender<DecisionRecord>) -> Self {
        self.persist = Some(sender);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one reading through the full pipeline.
    ///
    /// Always returns a complete record for a well-formed reading; model
    /// unavailability degrades inside the verdict, it never fails the call.
    pub fn decide(&self, reading: Reading) -> Result<DecisionRecord, ReadingError> {
        reading.validate()?;
        let now = reading.timestamp;

        // Health and watering prediction have no data dependency
        let health_score = health::score(&reading);
        let verdict = self.predictor.predict(&reading, now);

        let anomaly = self.detector.lock().observe(&reading.features());
        if anomaly.is_anomaly {
            log::warn!(
                "Anomalous reading (score {:.2}, channel {:?})",
                anomaly.score,
                anomaly.worst_channel
            );
        }

        let mut actuation_authorized = false;
        if verdict.water_now && verdict.confidence >= self.config.water_confidence_threshold {
            let mut safety = self.safety.lock();
            let outcome = safety::authorize(ActuationKind::Water, &safety, now, &self.limits);
            if outcome.approved {
                safety.mark_watered(now);
                actuation_authorized = true;
            } else {
                log::info!("Watering withheld: {}", outcome.reason);
            }
        }

        let record = DecisionRecord {
            id: Uuid::new_v4(),
            timestamp: now,
            reading,
            health_score,
            watering_verdict: verdict,
            anomaly_flag: anomaly.is_anomaly,
            actuation_authorized,
        };

        self.history.write().append(record.clone());

        if let Some(sender) = &self.persist {
            // Best-effort: a closed channel loses this copy, never the decision
            if sender.send(record.clone()).is_err() {
                log::warn!("Persistence channel closed, record not persisted");
            }
        }

        Ok(record)
    }

    /// Manual actuation request (operator-initiated, outside the pipeline).
    /// `force` bypasses the gate; the watering time is still recorded.
    pub fn manual_actuate(&self, action: ActuationKind, force: bool, now: f64) -> GateOutcome {
        match action {
            ActuationKind::Water => {
                let mut safety = self.safety.lock();
                let outcome = if force {
                    GateOutcome::approved("forced actuation")
                } else {
                    safety::authorize(ActuationKind::Water, &safety, now, &self.limits)
                };
                if outcome.approved {
                    safety.mark_watered(now);
                    log::info!("Manual watering executed (force: {})", force);
                }
                outcome
            }
            ActuationKind::Light => safety::authorize(ActuationKind::Light, &self.safety.lock(), now, &self.limits),
        }
    }

    /// Last `n` decision records, newest first (snapshot copy)
    pub fn recent(&self, n: usize) -> Vec<DecisionRecord> {
        self.history.read().recent(n)
    }

    /// Most recent record, if any
    pub fn latest(&self) -> Option<DecisionRecord> {
        self.history.read().latest().cloned()
    }

    pub fn status(&self) -> EngineStatus {
        let window = self.detector.lock().status();
        let history = self.history.read().stats();
        let safety = self.safety.lock();
        let metadata = self.predictor.classifier().metadata();

        EngineStatus {
            model_type: metadata.model_type.clone(),
            onnx_loaded: self.predictor.classifier().is_onnx_loaded(),
            water_confidence_threshold: self.config.water_confidence_threshold,
            window,
            history,
            last_watering_time: safety.last_watering_time,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DecisionEngine {
        DecisionEngine::new(EngineConfig::default(), WateringClassifier::bootstrap_only())
    }

    fn reading(soil: f64, timestamp: f64) -> Reading {
        Reading::new(soil, 25.0, 60.0, 550.0, timestamp).unwrap()
    }

    #[test]
    fn test_decide_returns_complete_record() {
        let engine = engine();
        let record = engine.decide(reading(550.0, 1_000.0)).unwrap();

        assert_eq!(record.health_score, 100.0);
        assert!(!record.watering_verdict.is_degraded());
        assert!(!record.anomaly_flag); // cold start
        assert_eq!(engine.recent(10).len(), 1);
    }

    #[test]
    fn test_invalid_reading_rejected_before_pipeline() {
        let engine = engine();
        let bad = Reading {
            soil_moisture: f64::NAN,
            temperature: 25.0,
            humidity: 60.0,
            light_intensity: 550.0,
            timestamp: 0.0,
        };
        assert!(engine.decide(bad).is_err());
        // Nothing entered the window or the history
        assert_eq!(engine.recent(10).len(), 0);
        assert_eq!(engine.status().window.current_size, 0);
    }

    #[test]
    fn test_history_bounded_through_engine() {
        let engine = engine();
        for i in 0..125 {
            engine.decide(reading(550.0, i as f64)).unwrap();
        }
        let status = engine.status();
        assert_eq!(status.history.current_size, 100);
        assert_eq!(status.window.current_size, 50);
    }

    #[test]
    fn test_authorization_respects_interval() {
        // Threshold 0 makes every verdict actionable, so only the gate decides
        let config = EngineConfig {
            water_confidence_threshold: 0.0,
            ..Default::default()
        };
        let engine = DecisionEngine::new(config, WateringClassifier::bootstrap_only());

        let first = engine.decide(reading(100.0, 1_000.0)).unwrap();
        assert!(first.actuation_authorized, "bootstrap watering should pass");

        // Inside the 6h interval: denied
        let second = engine.decide(reading(100.0, 2_000.0)).unwrap();
        assert!(!second.actuation_authorized);

        // Past the interval: eligible again
        let third = engine.decide(reading(100.0, 1_000.0 + 21_700.0)).unwrap();
        assert!(third.actuation_authorized);
    }

    #[test]
    fn test_manual_water_updates_safety_state() {
        let engine = engine();

        let outcome = engine.manual_actuate(ActuationKind::Water, false, 5_000.0);
        assert!(outcome.approved);
        assert_eq!(engine.status().last_watering_time, 5_000.0);

        // Second manual request inside the interval is denied without force
        let denied = engine.manual_actuate(ActuationKind::Water, false, 6_000.0);
        assert!(!denied.approved);

        // Force bypasses the gate and still records the time
        let forced = engine.manual_actuate(ActuationKind::Water, true, 7_000.0);
        assert!(forced.approved);
        assert_eq!(engine.status().last_watering_time, 7_000.0);
    }

    #[test]
    fn test_light_actuation_always_eligible() {
        let engine = engine();
        assert!(engine.manual_actuate(ActuationKind::Light, false, 1.0).approved);
    }
}
