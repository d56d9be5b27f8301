//! Incident ledger
//!
//! Bounded, append-only, in-memory. When full, appending evicts the oldest
//! record; a new record is never dropped. Nothing survives a restart.

use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::models::IncidentRecord;

/// Records kept before the oldest is evicted
pub const LEDGER_CAPACITY: usize = 1000;

pub struct IncidentLedger {
    records: RwLock<VecDeque<IncidentRecord>>,
    capacity: usize,
}

impl IncidentLedger {
    pub fn new() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&self, record: IncidentRecord) {
        let mut records = self.records.write();
        if records.len() >= self.capacity {
            if let Some(evicted) = records.pop_front() {
                tracing::debug!("Ledger full, evicting incident {}", evicted.incident_id);
            }
        }
        records.push_back(record);
    }

    /// Up to `limit` records, most recent first
    pub fn recent(&self, limit: usize) -> Vec<IncidentRecord> {
        self.records
            .read()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.records.read().len()
    }
}

impl Default for IncidentLedger {
    fn default() -> Self {
        Self::new()
    }
}
