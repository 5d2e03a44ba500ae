//! Anomaly Detector
//!
//! Rolling window của recent feature vectors + outlier scoring.
//! Cold start: dưới min-sample threshold thì KHÔNG bao giờ flag.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::sensors::{FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Standard deviations a channel must stray before it counts as an outlier
const OUTLIER_STDS: f32 = 2.5;

/// Variance floor - flat channels never divide by zero
const MIN_STD: f32 = 1e-6;

// ============================================================================
// REPORT
// ============================================================================

/// Outcome of one observation
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    pub is_anomaly: bool,
    /// Largest per-channel deviation, in standard deviations
    pub score: f32,
    /// Channel that drove the score, when the window is warm
    pub worst_channel: Option<&'static str>,
    pub threshold: f32,
    pub samples: usize,
    /// True while the window holds too few samples to judge
    pub cold_start: bool,
}

/// Window fill status for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowStatus {
    pub current_size: usize,
    pub capacity: usize,
    pub min_samples: usize,
    pub is_ready: bool,
    pub fill_percent: f32,
}

// ============================================================================
// DETECTOR
// ============================================================================

/// Bounded-window outlier detector.
///
/// Owns its window exclusively; `observe` is the only mutation path.
/// Stats are refit on every observation - the window is small enough
/// that the O(W) pass is cheaper than maintaining running moments.
pub struct AnomalyDetector {
    window: VecDeque<[f32; FEATURE_COUNT]>,
    capacity: usize,
    min_samples: usize,
}

impl AnomalyDetector {
    pub fn new(capacity: usize, min_samples: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            min_samples: min_samples.max(1),
        }
    }

    /// Observe one feature vector: append, evict past capacity, then judge
    /// the vector against the window's distribution.
    ///
    /// Append-then-evict is one logical step; the window is never left over
    /// capacity between calls.
    pub fn observe(&mut self, features: &FeatureVector) -> AnomalyReport {
        let current = *features.as_array();

        self.window.push_back(current);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        if self.window.len() < self.min_samples {
            return AnomalyReport {
                is_anomaly: false,
                score: 0.0,
                worst_channel: None,
                threshold: OUTLIER_STDS,
                samples: self.window.len(),
                cold_start: true,
            };
        }

        let (means, stds) = self.window_stats();

        let mut score = 0.0f32;
        let mut worst_channel = None;
        for i in 0..FEATURE_COUNT {
            let deviation = (current[i] - means[i]).abs() / stds[i];
            if deviation > score {
                score = deviation;
                worst_channel = Some(FEATURE_LAYOUT[i]);
            }
        }

        AnomalyReport {
            is_anomaly: score > OUTLIER_STDS,
            score,
            worst_channel,
            threshold: OUTLIER_STDS,
            samples: self.window.len(),
            cold_start: false,
        }
    }

    /// Mean and floored std per channel over the whole window
    fn window_stats(&self) -> ([f32; FEATURE_COUNT], [f32; FEATURE_COUNT]) {
        let n = self.window.len() as f32;

        let mut means = [0.0f32; FEATURE_COUNT];
        for sample in &self.window {
            for i in 0..FEATURE_COUNT {
                means[i] += sample[i];
            }
        }
        for m in means.iter_mut() {
            *m /= n;
        }

        let mut stds = [0.0f32; FEATURE_COUNT];
        for sample in &self.window {
            for i in 0..FEATURE_COUNT {
                stds[i] += (sample[i] - means[i]).powi(2);
            }
        }
        for s in stds.iter_mut() {
            *s = (*s / n).sqrt().max(MIN_STD);
        }

        (means, stds)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn status(&self) -> WindowStatus {
        WindowStatus {
            current_size: self.window.len(),
            capacity: self.capacity,
            min_samples: self.min_samples,
            is_ready: self.window.len() >= self.min_samples,
            fill_percent: (self.window.len() as f32 / self.capacity as f32 * 100.0).min(100.0),
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::sensors::FeatureVector;

    fn fv(soil: f32, temp: f32, humidity: f32, light: f32) -> FeatureVector {
        FeatureVector::from_values([soil, temp, humidity, light])
    }

    fn steady() -> FeatureVector {
        fv(550.0, 25.0, 60.0, 550.0)
    }

    #[test]
    fn test_cold_start_never_flags() {
        let mut detector = AnomalyDetector::new(50, 10);
        for _ in 0..9 {
            // Wildly different values, still inside cold start
            let report = detector.observe(&fv(-9999.0, 400.0, -50.0, 1e6));
            assert!(!report.is_anomaly);
            assert!(report.cold_start);
        }
    }

    #[test]
    fn test_window_length_bounded() {
        let mut detector = AnomalyDetector::new(50, 10);
        for calls in 1..=120usize {
            detector.observe(&steady());
            assert_eq!(detector.len(), calls.min(50));
        }
    }

    #[test]
    fn test_outlier_flagged_after_warmup() {
        let mut detector = AnomalyDetector::new(50, 10);
        // Small jitter so the window has nonzero variance
        for i in 0..30 {
            let jitter = (i % 5) as f32;
            detector.observe(&fv(550.0 + jitter, 25.0, 60.0, 550.0));
        }

        let report = detector.observe(&fv(5000.0, 25.0, 60.0, 550.0));
        assert!(report.is_anomaly);
        assert_eq!(report.worst_channel, Some("soil_moisture"));
        assert!(report.score > report.threshold);
    }

    #[test]
    fn test_steady_stream_stays_quiet() {
        let mut detector = AnomalyDetector::new(50, 10);
        for i in 0..60 {
            let jitter = (i % 7) as f32 * 0.5;
            let report = detector.observe(&fv(550.0 + jitter, 25.0, 60.0 + jitter, 550.0));
            assert!(!report.is_anomaly, "flagged steady sample {}", i);
        }
    }

    #[test]
    fn test_status_tracks_fill() {
        let mut detector = AnomalyDetector::new(50, 10);
        for _ in 0..5 {
            detector.observe(&steady());
        }
        let status = detector.status();
        assert_eq!(status.current_size, 5);
        assert!(!status.is_ready);
        assert_eq!(status.fill_percent, 10.0);
    }
}
