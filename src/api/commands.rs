//! Gateway Commands - API cho ingestion gateway và dashboard
//!
//! Request/response shapes match the device firmware and dashboard wire
//! format; the structs here are the single serialization boundary.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::logic::decision::ActuationKind;
use crate::logic::pipeline::{DecisionEngine, EngineStatus};
use crate::logic::sensors::Reading;
use crate::logic::DecisionRecord;

// ============================================================================
// HELPERS
// ============================================================================

/// Current time in unix seconds
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Flat ingestion payload from the device
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingInput {
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
    /// Unix seconds; defaults to server time when the device omits it
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Response the device acts on
#[derive(Debug, Clone, Serialize)]
pub struct DeviceResponse {
    /// Run the pump now (already safety-gated)
    pub water: bool,
    /// Grow-light toggle; scheduling is the gateway's concern
    pub light: bool,
    pub health_score: f64,
    pub anomaly_detected: bool,
}

/// Latest channel values for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct CurrentReadings {
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
}

/// One point of the dashboard chart
#[derive(Debug, Clone, Serialize)]
pub struct RecentPoint {
    pub timestamp: f64,
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
}

/// Aggregated dashboard view, derived purely from the history log.
/// Empty history yields empty fields - no mock data.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub current_readings: Option<CurrentReadings>,
    pub health_score: Option<f64>,
    pub watering_prediction: Option<crate::logic::WateringVerdict>,
    pub anomaly_detected: bool,
    pub recent_data: Vec<RecentPoint>,
}

/// Manual actuation request
#[derive(Debug, Clone, Deserialize)]
pub struct ActuateRequest {
    pub action: ActuationKind,
    #[serde(default)]
    pub force: bool,
    /// Desired light state, for `action: light`
    #[serde(default)]
    pub state: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActuateResponse {
    pub action: String,
    pub status: String,
    pub message: String,
    pub timestamp: f64,
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Receive one sensor reading and run the full decision pipeline
pub fn submit_reading(
    engine: &DecisionEngine,
    input: ReadingInput,
) -> Result<DeviceResponse, String> {
    let timestamp = input.timestamp.unwrap_or_else(now_secs);

    let reading = Reading::new(
        input.soil_moisture,
        input.temperature,
        input.humidity,
        input.light_intensity,
        timestamp,
    )
    .map_err(|e| e.to_string())?;

    let record = engine.decide(reading).map_err(|e| e.to_string())?;

    Ok(DeviceResponse {
        water: record.actuation_authorized,
        light: false,
        health_score: record.health_score,
        anomaly_detected: record.anomaly_flag,
    })
}

/// Full decision record for one reading (gateway debug endpoint)
pub fn submit_reading_detailed(
    engine: &DecisionEngine,
    input: ReadingInput,
) -> Result<DecisionRecord, String> {
    let timestamp = input.timestamp.unwrap_or_else(now_secs);
    let reading = Reading::new(
        input.soil_moisture,
        input.temperature,
        input.humidity,
        input.light_intensity,
        timestamp,
    )
    .map_err(|e| e.to_string())?;

    engine.decide(reading).map_err(|e| e.to_string())
}

/// Aggregated dashboard view from the latest record + recent history
pub fn dashboard_data(engine: &DecisionEngine) -> DashboardData {
    let latest = engine.latest();
    let recent_data = engine
        .recent(10)
        .into_iter()
        .map(|r| RecentPoint {
            timestamp: r.timestamp,
            soil_moisture: r.reading.soil_moisture,
            temperature: r.reading.temperature,
            humidity: r.reading.humidity,
            light_intensity: r.reading.light_intensity,
        })
        .collect();

    match latest {
        Some(record) => DashboardData {
            current_readings: Some(CurrentReadings {
                soil_moisture: record.reading.soil_moisture,
                temperature: record.reading.temperature,
                humidity: record.reading.humidity,
                light_intensity: record.reading.light_intensity,
            }),
            health_score: Some(record.health_score),
            watering_prediction: Some(record.watering_verdict),
            anomaly_detected: record.anomaly_flag,
            recent_data,
        },
        None => DashboardData {
            current_readings: None,
            health_score: None,
            watering_prediction: None,
            anomaly_detected: false,
            recent_data,
        },
    }
}

/// Manual actuator control
pub fn actuate(engine: &DecisionEngine, request: ActuateRequest) -> Result<ActuateResponse, String> {
    let now = now_secs();

    match request.action {
        ActuationKind::Water => {
            let outcome = engine.manual_actuate(ActuationKind::Water, request.force, now);
            if !outcome.approved {
                return Err(outcome.reason);
            }
            log::info!("Watering command received (force: {})", request.force);
            Ok(ActuateResponse {
                action: "water".to_string(),
                status: "executed".to_string(),
                message: "Watering command sent to device".to_string(),
                timestamp: now,
            })
        }
        ActuationKind::Light => {
            let light_state = request.state.unwrap_or(true);
            log::info!(
                "Light control command: {}",
                if light_state { "ON" } else { "OFF" }
            );
            Ok(ActuateResponse {
                action: "light".to_string(),
                status: "executed".to_string(),
                message: format!("Light turned {}", if light_state { "ON" } else { "OFF" }),
                timestamp: now,
            })
        }
    }
}

/// Engine status snapshot
pub fn engine_status(engine: &DecisionEngine) -> EngineStatus {
    engine.status()
}

// ============================================================================
// TESTS
// ============================================================================
