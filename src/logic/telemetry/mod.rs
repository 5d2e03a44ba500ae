//! Telemetry Module
//!
//! Decision-record logging. Without this log you can't trace why the
//! device watered, audit actuations, or export training data.
//!
//! ## Structure
//! - `recorder.rs` - Append-only JSONL writer with size rotation

use once_cell::sync::Lazy;

pub mod recorder;

pub use recorder::{read_records, Recorder, RecorderStats};

/// Process-lifetime session id, stamped into recorder stats so log files
/// from different boots can be told apart
static SESSION_ID: Lazy<String> = Lazy::new(|| uuid::Uuid::new_v4().to_string());

pub fn session_id() -> String {
    SESSION_ID.clone()
}
