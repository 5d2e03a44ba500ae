//! Logic Module - Decision Engine Internals
//!
//! Chứa các engines xử lý: Health Scorer, Watering Predictor, Anomaly
//! Detector, Safety Gate, History Log, và Decision Pipeline.
//!
//! ## Architecture
//! - `sensors` - Reading types, validation, feature layout
//! - `health` - heuristic wellness score
//! - `model/` - watering classifier (ONNX + bootstrap fallback)
//! - `anomaly` - rolling-window outlier detection
//! - `safety` - actuation safety gate
//! - `history` - bounded decision log
//! - `pipeline` - orchestration (the engine itself)
//! - `telemetry/` - local JSONL persistence
//! - `cloud_sync/` - remote store mirror
//! - `persist_loop` - background worker bridging both

pub mod anomaly;
pub mod cloud_sync;
pub mod config;
pub mod decision;
pub mod health;
pub mod history;
pub mod model;
pub mod persist_loop;
pub mod pipeline;
pub mod safety;
pub mod sensors;
pub mod telemetry;

pub use config::EngineConfig;
pub use decision::{ActuationKind, DecisionRecord, GateOutcome, WateringVerdict};
pub use pipeline::{DecisionEngine, EngineStatus};
pub use sensors::{Reading, ReadingError};
