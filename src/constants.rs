//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change a safety limit or threshold default, only edit this file.

/// Minimum interval between two watering actuations (seconds)
///
/// Hard safety floor: the pump must never be re-armed inside this window,
/// regardless of what the predictor says.
pub const DEFAULT_MIN_WATERING_INTERVAL_SECS: u64 = 6 * 3600;

/// Maximum single pump run (seconds) - enforced by the actuator driver
pub const DEFAULT_MAX_PUMP_TIME_SECS: u64 = 20;

/// Maximum total watering per day (seconds) - enforced by the actuator driver
pub const DEFAULT_MAX_DAILY_WATERING_SECS: u64 = 60;

/// Confidence required before a watering verdict may actuate
pub const DEFAULT_WATER_CONFIDENCE_THRESHOLD: f32 = 0.85;

/// Rolling window capacity for anomaly detection
pub const DEFAULT_ANOMALY_WINDOW_SIZE: usize = 50;

/// Minimum samples before the detector may flag anything
pub const DEFAULT_ANOMALY_MIN_SAMPLES: usize = 10;

/// In-memory decision history capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default remote store URL
///
/// This is the fallback URL when no environment variable is set.
/// For development: http://localhost:8080
pub const DEFAULT_STORE_URL: &str = "https://store.leafguard.dev";

/// Default record sync interval (seconds)
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "LeafGuard";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get remote store URL from environment or use default
pub fn get_store_url() -> String {
    std::env::var("LEAFGUARD_STORE_URL").unwrap_or_else(|_| DEFAULT_STORE_URL.to_string())
}

/// Get record sync interval from environment or use default
pub fn get_sync_interval() -> u64 {
    std::env::var("LEAFGUARD_SYNC_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS)
}

/// Check if cloud sync is enabled
pub fn is_cloud_sync_enabled() -> bool {
    std::env::var("LEAFGUARD_CLOUD_SYNC")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}

/// Get ONNX watering-model path from environment, if set
pub fn get_model_path() -> Option<String> {
    std::env::var("LEAFGUARD_MODEL_PATH").ok()
}

/// Get expected SHA-256 of the model artifact from environment, if set
pub fn get_model_checksum() -> Option<String> {
    std::env::var("LEAFGUARD_MODEL_SHA256").ok()
}
