//! Safety Gate
//!
//! Policy function chặn actuation quá tần suất.
//! ĐÂY là nơi làm Safety - không phải AI, không phải predictor.
//! The gate certifies eligibility to START an actuation; run-duration
//! limits are enforced by the actuator driver downstream.

use serde::{Deserialize, Serialize};

use crate::constants;

use super::decision::{ActuationKind, GateOutcome};

// ============================================================================
// SAFETY LIMITS
// ============================================================================

/// Hard actuation limits. Interval is enforced here; pump-time and
/// daily-total are declared for the actuator driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyLimits {
    pub min_watering_interval_secs: u64,
    pub max_pump_time_secs: u64,
    pub max_daily_watering_secs: u64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            min_watering_interval_secs: constants::DEFAULT_MIN_WATERING_INTERVAL_SECS,
            max_pump_time_secs: constants::DEFAULT_MAX_PUMP_TIME_SECS,
            max_daily_watering_secs: constants::DEFAULT_MAX_DAILY_WATERING_SECS,
        }
    }
}

// ============================================================================
// SAFETY STATE
// ============================================================================

/// The single piece of state the gate consults.
///
/// A fresh device has `last_watering_time = 0`, i.e. "never watered", which
/// the gate treats as eligible. Deliberate bootstrap choice: a new install
/// must be able to authorize its first watering.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SafetyState {
    /// Unix seconds of the last AUTHORIZED watering; 0 = never
    pub last_watering_time: f64,
}

impl SafetyState {
    /// Record an authorized watering
    pub fn mark_watered(&mut self, now: f64) {
        self.last_watering_time = now;
    }
}

// ============================================================================
// GATE
// ============================================================================

/// Pure decision function: no hidden state beyond what is passed in,
/// never fails.
pub fn authorize(
    action: ActuationKind,
    state: &SafetyState,
    now: f64,
    limits: &SafetyLimits,
) -> GateOutcome {
    match action {
        ActuationKind::Water => {
            // last_watering_time == 0 means "never watered": a fresh device
            // is eligible regardless of its clock
            if state.last_watering_time <= 0.0 {
                return GateOutcome::approved("safe to actuate");
            }
            let elapsed = now - state.last_watering_time;
            if elapsed < limits.min_watering_interval_secs as f64 {
                GateOutcome::denied("minimum watering interval not met")
            } else {
                GateOutcome::approved("safe to actuate")
            }
        }
        // Light has no interval constraint
        ActuationKind::Light => GateOutcome::approved("safe to actuate"),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denies_inside_interval() {
        let limits = SafetyLimits::default();
        let state = SafetyState {
            last_watering_time: 10_000.0,
        };

        // Sweep a range of now values strictly inside the interval
        for offset in [0.0, 1.0, 600.0, 21_599.0] {
            let outcome = authorize(ActuationKind::Water, &state, 10_000.0 + offset, &limits);
            assert!(!outcome.approved, "approved at offset {}", offset);
            assert_eq!(outcome.reason, "minimum watering interval not met");
        }
    }

    #[test]
    fn test_approves_at_and_past_interval() {
        let limits = SafetyLimits::default();
        let state = SafetyState {
            last_watering_time: 10_000.0,
        };

        for offset in [21_600.0, 21_601.0, 1e6] {
            let outcome = authorize(ActuationKind::Water, &state, 10_000.0 + offset, &limits);
            assert!(outcome.approved, "denied at offset {}", offset);
            assert_eq!(outcome.reason, "safe to actuate");
        }
    }

    #[test]
    fn test_never_watered_bootstrap_passes() {
        // Fresh device: last=0, now=100 - eligible even with a tiny clock
        let outcome = authorize(
            ActuationKind::Water,
            &SafetyState::default(),
            100.0,
            &SafetyLimits::default(),
        );
        assert!(outcome.approved);
        assert_eq!(outcome.reason, "safe to actuate");
    }

    #[test]
    fn test_light_is_unconstrained() {
        let state = SafetyState {
            last_watering_time: 10_000.0,
        };
        let outcome = authorize(ActuationKind::Light, &state, 10_001.0, &SafetyLimits::default());
        assert!(outcome.approved);
    }

    #[test]
    fn test_mark_watered_updates_state() {
        let mut state = SafetyState::default();
        state.mark_watered(5_000.0);
        assert_eq!(state.last_watering_time, 5_000.0);
    }
}
