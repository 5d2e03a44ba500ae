//! LeafGuard Core - Main Entry Point
//!
//! The HTTP gateway lives outside this crate; this binary is the stdio
//! shim it drives. One JSON request per line in, one JSON reply per line
//! out.

mod api;
mod constants;
mod logic;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use serde::Deserialize;

use logic::cloud_sync::SyncConfig;
use logic::model::WateringClassifier;
use logic::telemetry::Recorder;
use logic::{DecisionEngine, EngineConfig};

// ============================================================================
// GATEWAY PROTOCOL
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum GatewayRequest {
    /// Sensor reading (the once-per-cycle decision request)
    Data {
        #[serde(flatten)]
        input: api::ReadingInput,
    },
    /// Manual actuator control
    Actuate {
        #[serde(flatten)]
        request: api::ActuateRequest,
    },
    /// Aggregated dashboard view
    Dashboard,
    /// Engine status
    Status,
}

fn error_reply(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn json_reply<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_reply(&format!("serialize: {}", e)))
}

fn handle_line(engine: &DecisionEngine, line: &str) -> String {
    // Tagged envelope first; a bare reading payload is also accepted
    let request = match serde_json::from_str::<GatewayRequest>(line) {
        Ok(request) => request,
        Err(_) => match serde_json::from_str::<api::ReadingInput>(line) {
            Ok(input) => GatewayRequest::Data { input },
            Err(e) => return error_reply(&format!("unrecognized request: {}", e)),
        },
    };

    match request {
        GatewayRequest::Data { input } => match api::submit_reading(engine, input) {
            Ok(response) => json_reply(&response),
            Err(e) => error_reply(&e),
        },
        GatewayRequest::Actuate { request } => match api::actuate(engine, request) {
            Ok(response) => json_reply(&response),
            Err(e) => error_reply(&e),
        },
        GatewayRequest::Dashboard => json_reply(&api::dashboard_data(engine)),
        GatewayRequest::Status => json_reply(&api::engine_status(engine)),
    }
}

// ============================================================================
// ENTRY POINT
// ============================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} core v{}...",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    let config = EngineConfig::from_env();

    // Watering classifier: ONNX artifact when configured, bootstrap otherwise
    let classifier = match constants::get_model_path() {
        Some(path) => {
            let checksum = constants::get_model_checksum();
            match WateringClassifier::load_onnx(&path, checksum.as_deref()) {
                Ok(classifier) => {
                    log::info!("ONNX watering model loaded");
                    classifier
                }
                Err(e) => {
                    log::warn!("Model load failed: {} - using bootstrap classifier", e);
                    WateringClassifier::bootstrap_only()
                }
            }
        }
        None => {
            log::info!("No model artifact configured - using bootstrap classifier");
            WateringClassifier::bootstrap_only()
        }
    };

    // Persistence: local JSONL log + best-effort remote store mirror
    let recorder = match Recorder::in_default_dir() {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            log::warn!("Decision log init failed: {} - records kept in memory only", e);
            None
        }
    };
    let persist = logic::persist_loop::start(recorder, SyncConfig::default());

    let engine = Arc::new(DecisionEngine::new(config, classifier).with_persistence(persist.sender()));

    log::info!("Engine ready; reading gateway requests from stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = handle_line(&engine, &line);
        let mut out = stdout.lock();
        if writeln!(out, "{}", reply).is_err() {
            break;
        }
    }

    drop(engine);
    persist.shutdown();
    log::info!("Shutdown complete");
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

    #[test]
    fn test_bare_reading_line() {
        let engine = engine();
        let reply = handle_line(
            &engine,
            r#"{"soil_moisture":550,"temperature":25,"humidity":60,"light_intensity":550,"timestamp":1000}"#,
        );
        assert!(reply.contains("\"health_score\":100.0"));
    }

    #[test]
    fn test_tagged_data_line() {
        let engine = engine();
        let reply = handle_line(
            &engine,
            r#"{"cmd":"data","soil_moisture":100,"temperature":25,"humidity":60,"light_intensity":550,"timestamp":1000}"#,
        );
        assert!(reply.contains("\"health_score\":75.0"));
    }

    #[test]
    fn test_dashboard_and_status_lines() {
        let engine = engine();
        assert!(handle_line(&engine, r#"{"cmd":"dashboard"}"#).contains("recent_data"));
        assert!(handle_line(&engine, r#"{"cmd":"status"}"#).contains("window"));
    }

    #[test]
    fn test_garbage_line_is_an_error_reply() {
        let engine = engine();
        let reply = handle_line(&engine, "not json at all");
        assert!(reply.contains("error"));
    }
}
