//! Engine Configuration
//!
//! Strongly-typed configuration for the decision engine.
//! Can be loaded from environment or set at construction.

use serde::{Deserialize, Serialize};

use crate::constants;

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Engine configuration (single serialization boundary for all tunables)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum interval between watering actuations (seconds)
    pub min_watering_interval_secs: u64,
    /// Maximum single pump run (seconds, enforced by the actuator driver)
    pub max_pump_time_secs: u64,
    /// Maximum total watering per day (seconds, enforced downstream)
    pub max_daily_watering_secs: u64,
    /// Confidence required before a watering verdict may actuate
    pub water_confidence_threshold: f32,
    /// Rolling window capacity for anomaly detection
    pub anomaly_window_size: usize,
    /// Minimum samples before the detector may flag anything
    pub anomaly_min_samples: usize,
    /// In-memory decision history capacity
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_watering_interval_secs: constants::DEFAULT_MIN_WATERING_INTERVAL_SECS,
            max_pump_time_secs: constants::DEFAULT_MAX_PUMP_TIME_SECS,
            max_daily_watering_secs: constants::DEFAULT_MAX_DAILY_WATERING_SECS,
            water_confidence_threshold: constants::DEFAULT_WATER_CONFIDENCE_THRESHOLD,
            anomaly_window_size: constants::DEFAULT_ANOMALY_WINDOW_SIZE,
            anomaly_min_samples: constants::DEFAULT_ANOMALY_MIN_SAMPLES,
            history_capacity: constants::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Conservative mode - waters less eagerly, longer safety interval
    pub fn conservative() -> Self {
        Self {
            water_confidence_threshold: 0.95,
            min_watering_interval_secs: 12 * 3600,
            ..Default::default()
        }
    }

    /// Responsive mode - for greenhouse deployments with fast-draining pots
    pub fn responsive() -> Self {
        Self {
            water_confidence_threshold: 0.75,
            min_watering_interval_secs: 2 * 3600,
            ..Default::default()
        }
    }

    /// Load config from environment, falling back to defaults per field
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_watering_interval_secs: env_u64(
                "LEAFGUARD_MIN_WATERING_INTERVAL",
                defaults.min_watering_interval_secs,
            ),
            max_pump_time_secs: env_u64("LEAFGUARD_MAX_PUMP_TIME", defaults.max_pump_time_secs),
            max_daily_watering_secs: env_u64(
                "LEAFGUARD_MAX_DAILY_WATERING",
                defaults.max_daily_watering_secs,
            ),
            water_confidence_threshold: env_f32(
                "LEAFGUARD_WATER_CONFIDENCE",
                defaults.water_confidence_threshold,
            ),
            anomaly_window_size: env_usize(
                "LEAFGUARD_ANOMALY_WINDOW",
                defaults.anomaly_window_size,
            ),
            anomaly_min_samples: env_usize(
                "LEAFGUARD_ANOMALY_MIN_SAMPLES",
                defaults.anomaly_min_samples,
            ),
            history_capacity: env_usize("LEAFGUARD_HISTORY_CAPACITY", defaults.history_capacity),
        }
    }
}

fn env_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

fn env_f32(key: &str, fallback: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

fn env_usize(key: &str, fallback: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.min_watering_interval_secs, 21600);
        assert_eq!(config.water_confidence_threshold, 0.85);
        assert_eq!(config.anomaly_window_size, 50);
        assert_eq!(config.anomaly_min_samples, 10);
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn test_conservative_config() {
        let config = EngineConfig::conservative();
        assert_eq!(config.water_confidence_threshold, 0.95);
        assert_eq!(config.min_watering_interval_secs, 12 * 3600);
    }

    #[test]
    fn test_responsive_config() {
        let config = EngineConfig::responsive();
        assert!(config.water_confidence_threshold < EngineConfig::default().water_confidence_threshold);
    }
}
