//! Watering Predictor
//!
//! Verdict assembly on top of the classifier.
//! Threshold is a tunable config field, not a magic constant - it balances
//! false-positive watering against missed watering.

use crate::logic::decision::{PredictionMethod, WateringVerdict};
use crate::logic::sensors::Reading;

use super::inference::WateringClassifier;

// ============================================================================
// VERDICT ASSEMBLY
// ============================================================================

/// Build a verdict from a raw positive-class probability.
///
/// `next_watering` is monotone in confidence: higher probability brings the
/// estimate closer, floored at one hour out.
pub fn verdict_from_probability(
    probability: f32,
    now: f64,
    threshold: f32,
    method: PredictionMethod,
) -> WateringVerdict {
    let confidence = probability.clamp(0.0, 1.0);
    let water_now = confidence >= threshold;

    let next_watering_hours = ((6.0 * (1.0 - confidence)).round() as i64).max(1);
    let next_watering = now + (next_watering_hours * 3600) as f64;

    WateringVerdict {
        water_now,
        confidence,
        next_watering: Some(next_watering),
        method,
    }
}

// ============================================================================
// PREDICTOR
// ============================================================================

/// Wraps the classifier; converts a reading into a WateringVerdict
pub struct WateringPredictor {
    classifier: WateringClassifier,
    threshold: f32,
}

impl WateringPredictor {
    pub fn new(classifier: WateringClassifier, threshold: f32) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn classifier(&self) -> &WateringClassifier {
        &self.classifier
    }

    /// Predict watering need for one reading.
    ///
    /// Classifier failure degrades to the documented fallback verdict;
    /// it is never surfaced as an error to the pipeline.
    pub fn predict(&self, reading: &Reading, now: f64) -> WateringVerdict {
        let features = reading.features();

        match self.classifier.probability(features.as_array()) {
            Ok((probability, backend)) => {
                let method = match backend {
                    "onnx" => PredictionMethod::Onnx,
                    _ => PredictionMethod::Bootstrap,
                };
                verdict_from_probability(probability, now, self.threshold, method)
            }
            Err(e) => {
                log::warn!("Watering classifier unavailable ({}), degraded verdict", e);
                WateringVerdict::degraded()
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_probability_waters_within_the_hour() {
        // p=0.9: round(6*0.1)=1 hour out
        let now = 1_700_000_000.0;
        let v = verdict_from_probability(0.9, now, 0.85, PredictionMethod::Bootstrap);
        assert!(v.water_now);
        assert_eq!(v.confidence, 0.9);
        assert_eq!(v.next_watering, Some(now + 3600.0));
    }

    #[test]
    fn test_low_probability_estimates_later() {
        // p=0.1: round(6*0.9)=5 hours out, below threshold
        let now = 0.0;
        let v = verdict_from_probability(0.1, now, 0.85, PredictionMethod::Bootstrap);
        assert!(!v.water_now);
        assert_eq!(v.next_watering, Some(5.0 * 3600.0));
    }

    #[test]
    fn test_next_watering_floored_at_one_hour() {
        let v = verdict_from_probability(1.0, 0.0, 0.85, PredictionMethod::Onnx);
        assert_eq!(v.next_watering, Some(3600.0));
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        let at = verdict_from_probability(0.85, 0.0, 0.85, PredictionMethod::Bootstrap);
        let below = verdict_from_probability(0.8499, 0.0, 0.85, PredictionMethod::Bootstrap);
        assert!(at.water_now);
        assert!(!below.water_now);
    }

    #[test]
    fn test_predictor_end_to_end_bootstrap() {
        use crate::logic::model::inference::WateringClassifier;
        use crate::logic::sensors::Reading;

        let predictor = WateringPredictor::new(WateringClassifier::bootstrap_only(), 0.85);
        let reading = Reading::new(550.0, 25.0, 60.0, 550.0, 0.0).unwrap();
        let v = predictor.predict(&reading, 1_000.0);

        assert!(!v.is_degraded());
        assert!(v.next_watering.is_some());
        assert!((0.0..=1.0).contains(&v.confidence));
    }
}
