//! History Log
//!
//! Bounded append-only store of decision records.
//! Sole source of truth for "recent data" dashboard queries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::decision::DecisionRecord;

// ============================================================================
// STATS
// ============================================================================

/// Log fill status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryStats {
    pub current_size: usize,
    pub capacity: usize,
    pub total_appended: u64,
    pub evicted: u64,
}

// ============================================================================
// HISTORY LOG
// ============================================================================

/// FIFO-evicted record log, capacity fixed at construction.
///
/// Append and eviction are one logical step: the log is never observed
/// over capacity.
pub struct HistoryLog {
    records: VecDeque<DecisionRecord>,
    capacity: usize,
    total_appended: u64,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            total_appended: 0,
        }
    }

    /// Append a record, evicting the oldest when at capacity. O(1) amortized.
    pub fn append(&mut self, record: DecisionRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
        self.total_appended += 1;
    }

    /// Last `n` records, newest first. `n` is clamped to available count.
    pub fn recent(&self, n: usize) -> Vec<DecisionRecord> {
        self.records.iter().rev().take(n).cloned().collect()
    }

    /// Most recent record, if any
    pub fn latest(&self) -> Option<&DecisionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            current_size: self.records.len(),
            capacity: self.capacity,
            total_appended: self.total_appended,
            evicted: self.total_appended - self.records.len() as u64,
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
    use uuid::Uuid;

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

    #[test]
    fn test_append_within_capacity() {
        let mut log = HistoryLog::new(100);
        for i in 0..40 {
            log.append(record(i as f64));
        }
        assert_eq!(log.len(), 40);
        assert_eq!(log.latest().unwrap().timestamp, 39.0);
    }

    #[test]
    fn test_oldest_evicted_past_capacity() {
        // H + k appends leave exactly H records, the k most recent survive
        let mut log = HistoryLog::new(100);
        for i in 0..125 {
            log.append(record(i as f64));
        }
        assert_eq!(log.len(), 100);

        let recent = log.recent(100);
        assert_eq!(recent.len(), 100);
        // Newest first: 124 down to 25
        assert_eq!(recent.first().unwrap().timestamp, 124.0);
        assert_eq!(recent.last().unwrap().timestamp, 25.0);
    }

    #[test]
    fn test_recent_clamped_and_ordered() {
        let mut log = HistoryLog::new(100);
        for i in 0..3 {
            log.append(record(i as f64));
        }

        let recent = log.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].timestamp, 2.0);
        assert_eq!(recent[2].timestamp, 0.0);
    }

    #[test]
    fn test_stats_count_evictions() {
        let mut log = HistoryLog::new(10);
        for i in 0..14 {
            log.append(record(i as f64));
        }
        let stats = log.stats();
        assert_eq!(stats.current_size, 10);
        assert_eq!(stats.total_appended, 14);
        assert_eq!(stats.evicted, 4);
    }
}
