//! Persistence Loop
//!
//! Background worker bridging the pipeline to the local JSONL log and the
//! remote store. The decision path only sends on a channel; every write
//! happens here, so persistence failures can never block or fail a
//! decision.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::cloud_sync::{SyncConfig, SyncStatus, Syncer};
use super::decision::DecisionRecord;
use super::telemetry::Recorder;

/// Channel poll interval; bounds shutdown latency
const POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// HANDLE
// ============================================================================

/// Handle to the running worker. Cloning the sender is cheap; the worker
/// exits once every sender is dropped.
pub struct PersistHandle {
    sender: Sender<DecisionRecord>,
    status: Arc<RwLock<SyncStatus>>,
    join: Option<JoinHandle<()>>,
}

impl PersistHandle {
    pub fn sender(&self) -> Sender<DecisionRecord> {
        self.sender.clone()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.status.read().clone()
    }

    /// Drop the sender and wait for the worker to drain and flush
    pub fn shutdown(self) {
        let PersistHandle { sender, join, .. } = self;
        drop(sender);
        if let Some(handle) = join {
            let _ = handle.join();
        }
    }
}

// ============================================================================
// WORKER
// ============================================================================

/// Spawn the persistence worker
pub fn start(recorder: Option<Recorder>, sync_config: SyncConfig) -> PersistHandle {
    let (sender, receiver) = channel();
    let status: Arc<RwLock<SyncStatus>> = Arc::new(RwLock::new(SyncStatus::default()));
    let status_clone = Arc::clone(&status);

    let join = thread::spawn(move || {
        log::info!("Persistence loop started");
        run(receiver, recorder, sync_config, status_clone);
    });

    PersistHandle {
        sender,
        status,
        join: Some(join),
    }
}

fn run(
    receiver: Receiver<DecisionRecord>,
    mut recorder: Option<Recorder>,
    sync_config: SyncConfig,
    status: Arc<RwLock<SyncStatus>>,
) {
    // Current-thread runtime: the worker is the only task, no pool needed
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create persistence runtime: {}", e);
            return;
        }
    };

    let sync_interval = Duration::from_secs(sync_config.sync_interval_secs.max(1));
    let mut syncer = Syncer::new(sync_config);
    let mut last_flush = Instant::now();

    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(record) => {
                if let Some(rec) = recorder.as_mut() {
                    if let Err(e) = rec.record(&record) {
                        log::error!("Failed to write decision log: {}", e);
                    }
                }
                if syncer.is_enabled() {
                    syncer.queue(record);
                    *status.write() = syncer.status();
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if last_flush.elapsed() >= sync_interval && syncer.pending_count() > 0 {
            rt.block_on(syncer.flush());
            last_flush = Instant::now();
            *status.write() = syncer.status();
        }
    }

    // Drain: one final flush attempt, then close the log
    if syncer.pending_count() > 0 {
        rt.block_on(syncer.flush());
    }
    *status.write() = syncer.status();
    if let Some(rec) = recorder.as_mut() {
        rec.shutdown();
    }
    log::info!("Persistence loop stopped");
}

// ============================================================================
// TESTS
// ============================================================================
