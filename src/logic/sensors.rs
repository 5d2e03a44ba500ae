//! Sensor Readings - Ingestion types and feature layout
//!
//! Một Reading = một snapshot cảm biến (soil, temp, humidity, light).
//! Malformed readings are rejected HERE, before the pipeline runs.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

/// Feature names in exact order they appear in the vector
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURE_LAYOUT: &[&str] = &[
    "soil_moisture",   // 0: Capacitive probe, raw ADC scale (~0-1000)
    "temperature",     // 1: Degrees Celsius
    "humidity",        // 2: Relative humidity percent
    "light_intensity", // 3: Photoresistor, lux-like scale
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 4;

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches in persisted records
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }
    hasher.finalize()
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Invalid reading rejected at the ingestion boundary
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingError {
    pub channel: &'static str,
    pub value: f64,
}

impl std::fmt::Display for ReadingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ReadingError: channel '{}' has non-finite value {}",
            self.channel, self.value
        )
    }
}

impl std::error::Error for ReadingError {}

// ============================================================================
// READING
// ============================================================================

/// One sampled sensor snapshot. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
    /// Unix seconds
    pub timestamp: f64,
}

impl Reading {
    /// Build a validated reading. Every channel must be a finite number.
    pub fn new(
        soil_moisture: f64,
        temperature: f64,
        humidity: f64,
        light_intensity: f64,
        timestamp: f64,
    ) -> Result<Self, ReadingError> {
        let reading = Self {
            soil_moisture,
            temperature,
            humidity,
            light_intensity,
            timestamp,
        };
        reading.validate()?;
        Ok(reading)
    }

    /// Reject non-finite channels (NaN, infinities)
    pub fn validate(&self) -> Result<(), ReadingError> {
        let channels = [
            ("soil_moisture", self.soil_moisture),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("light_intensity", self.light_intensity),
            ("timestamp", self.timestamp),
        ];
        for (channel, value) in channels {
            if !value.is_finite() {
                return Err(ReadingError { channel, value });
            }
        }
        Ok(())
    }

    /// Feature vector in FEATURE_LAYOUT order
    pub fn features(&self) -> FeatureVector {
        FeatureVector::from_values([
            self.soil_moisture as f32,
            self.temperature as f32,
            self.humidity as f32,
            self.light_intensity as f32,
        ])
    }
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Versioned feature vector with layout metadata
///
/// Persisted records carry version + layout hash so logged training data
/// stays replayable across schema changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create from raw values with current version
    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Get values as array reference
    pub fn as_array(&self) -> &[f32; FEATURE_COUNT] {
        &self.values
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        FEATURE_LAYOUT
            .iter()
            .position(|&n| n == name)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Check if this vector is compatible with the current layout
    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION && self.layout_hash == layout_hash()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_count_matches() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_valid_reading() {
        let reading = Reading::new(550.0, 25.0, 60.0, 550.0, 1_700_000_000.0).unwrap();
        assert_eq!(reading.features().values, [550.0, 25.0, 60.0, 550.0]);
    }

    #[test]
    fn test_nan_rejected() {
        let err = Reading::new(f64::NAN, 25.0, 60.0, 550.0, 0.0).unwrap_err();
        assert_eq!(err.channel, "soil_moisture");
    }

    #[test]
    fn test_infinite_rejected() {
        let err = Reading::new(550.0, 25.0, f64::INFINITY, 550.0, 0.0).unwrap_err();
        assert_eq!(err.channel, "humidity");
    }

    #[test]
    fn test_feature_lookup_by_name() {
        let reading = Reading::new(100.0, 20.0, 50.0, 300.0, 0.0).unwrap();
        let fv = reading.features();
        assert_eq!(fv.get_by_name("temperature"), Some(20.0));
        assert_eq!(fv.get_by_name("nope"), None);
    }

    #[test]
    fn test_layout_hash_stable() {
        assert_eq!(layout_hash(), layout_hash());
        let fv = FeatureVector::from_values([0.0; FEATURE_COUNT]);
        assert!(fv.is_compatible());
    }
}
