//! Record Sync
//!
//! Batches decision records and pushes them to the remote store on an
//! interval. Best-effort: failures are logged, records stay queued for the
//! next attempt (bounded, oldest dropped first).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;
use crate::logic::decision::DecisionRecord;

use super::client::{StoreClient, StoreConfig};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Pending queue cap - a dead store must not grow memory without bound
const MAX_PENDING: usize = 500;

// ============================================================================
// CONFIG & STATUS
// ============================================================================

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote store URL
    pub server_url: String,
    /// Record sync interval in seconds
    pub sync_interval_secs: u64,
    /// Enable cloud sync
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: constants::get_store_url(),
            sync_interval_secs: constants::get_sync_interval(),
            enabled: constants::is_cloud_sync_enabled(),
        }
    }
}

/// Sync status snapshot for the status API
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStatus {
    pub is_connected: bool,
    pub is_registered: bool,
    pub device_id: Option<Uuid>,
    pub last_sync: Option<DateTime<Utc>>,
    pub records_synced: u64,
    pub pending_records: usize,
    pub last_error: Option<String>,
    pub server_version: Option<String>,
}

// ============================================================================
// SYNCER
// ============================================================================

/// Owns the store client and the pending batch. Driven by the persistence
/// worker; nothing here is global.
pub struct Syncer {
    client: StoreClient,
    config: SyncConfig,
    pending: Vec<DecisionRecord>,
    status: SyncStatus,
}

impl Syncer {
    pub fn new(config: SyncConfig) -> Self {
        let client = StoreClient::new(StoreConfig {
            server_url: config.server_url.clone(),
            timeout_seconds: 30,
        });

        Self {
            client,
            config,
            pending: Vec::new(),
            status: SyncStatus::default(),
        }
    }

    pub fn status(&self) -> SyncStatus {
        let mut status = self.status.clone();
        status.pending_records = self.pending.len();
        status
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Queue a record for the next flush, dropping the oldest past the cap
    pub fn queue(&mut self, record: DecisionRecord) {
        self.pending.push(record);
        if self.pending.len() > MAX_PENDING {
            let overflow = self.pending.len() - MAX_PENDING;
            self.pending.drain(..overflow);
            log::warn!("Sync queue full, dropped {} oldest record(s)", overflow);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// One sync attempt: connect + register on first contact, then push the
    /// pending batch. Errors are recorded in the status, never returned.
    pub async fn flush(&mut self) {
        if !self.config.enabled || self.pending.is_empty() {
            return;
        }

        if !self.status.is_connected {
            match self.client.health_check().await {
                Ok(health) => {
                    log::info!("Store healthy: v{}", health.version);
                    self.status.is_connected = true;
                    self.status.server_version = Some(health.version);
                }
                Err(e) => {
                    log::debug!("Store not reachable: {}", e);
                    self.status.last_error = Some(e.to_string());
                    return;
                }
            }
        }

        if !self.client.is_registered() {
            if let Err(e) = self.client.register().await {
                log::warn!("Device registration failed: {}", e);
                self.status.last_error = Some(e.to_string());
                self.status.is_connected = false;
                return;
            }
            self.status.is_registered = true;
            self.status.device_id = Some(self.client.device_id());
        }

        match self.client.sync_records(&self.pending).await {
            Ok(response) => {
                log::debug!("Synced {} record(s) to store", response.synced_count);
                self.status.records_synced += response.synced_count as u64;
                self.status.last_sync = Some(Utc::now());
                self.status.last_error = None;
                self.pending.clear();
            }
            Err(e) => {
                // Keep the batch; retry on the next interval
                log::warn!("Record sync failed ({} pending): {}", self.pending.len(), e);
                self.status.last_error = Some(e.to_string());
                self.status.is_connected = false;
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::decision::WateringVerdict;
    use crate::logic::sensors::Reading;

    fn record(timestamp: f64) -> DecisionRecord {
        DecisionRecord {
            id: Uuid::new_v4(),
            timestamp,
            reading: Reading::new(550.0, 25.0, 60.0, 550.0, timestamp).unwrap(),
            health_score: 100.0,
            watering_verdict: WateringVerdict::degraded(),
            anomaly_flag: false,
            actuation_authorized: false,
        }
    }

    fn test_config() -> SyncConfig {
        SyncConfig {
            server_url: "http://localhost:9".to_string(),
            sync_interval_secs: 60,
            enabled: true,
        }
    }

    #[test]
    fn test_queue_bounded() {
        let mut syncer = Syncer::new(test_config());
        for i in 0..(MAX_PENDING + 25) {
            syncer.queue(record(i as f64));
        }
        assert_eq!(syncer.pending_count(), MAX_PENDING);
    }

    #[tokio::test]
    async fn test_flush_against_dead_store_keeps_batch() {
        let mut syncer = Syncer::new(test_config());
        syncer.queue(record(1.0));

        syncer.flush().await;

        // Unreachable store: batch kept, error recorded, no panic
        assert_eq!(syncer.pending_count(), 1);
        let status = syncer.status();
        assert!(!status.is_connected);
        assert!(status.last_error.is_some());
    }

    #[test]
    fn test_disabled_syncer_reports_status() {
        let syncer = Syncer::new(SyncConfig {
            enabled: false,
            ..test_config()
        });
        assert!(!syncer.is_enabled());
        assert_eq!(syncer.status().pending_records, 0);
    }
}
