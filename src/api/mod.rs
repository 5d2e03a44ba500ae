//! API Module
//!
//! Command layer the ingestion gateway calls. HTTP routing and
//! marshaling live outside this crate; these functions are the whole
//! surface it needs.

pub mod commands;

pub use commands::*;
