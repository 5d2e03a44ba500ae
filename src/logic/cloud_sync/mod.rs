//! Cloud Sync Module - Device to Document Store Communication
//!
//! This module handles:
//! - Device registration with the remote store
//! - Batched best-effort upload of decision records
//!
//! Upload is fire-and-forget: a failed push is logged and retried on the
//! next interval; the decision path never waits on it.

pub mod client;
pub mod sync;

pub use client::{StoreClient, StoreConfig, StoreError};
pub use sync::{SyncConfig, SyncStatus, Syncer};
