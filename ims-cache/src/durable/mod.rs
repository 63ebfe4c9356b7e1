//! Write-behind durable log. The grid is authoritative for reads; this
//! module is the "durable store is a write-behind log" half of spec.md
//! §5's shared-resource policy - every cache mutation is appended here
//! before (or concurrently with) being acknowledged, and [`DurableLog::replay`]
//! reproduces the cache deterministically on cold start.
//!
//! Grounded in `jackbot-snapshot::SnapshotScheduler`/`FakeRedis`: that
//! module periodically drained an in-memory map to a parquet file on an
//! interval tick. Here the direction is reversed and continuous - records
//! are appended as they happen, not drained on a timer - because the log
//! must be replayable to the exact last acknowledged write, not just to
//! the last periodic snapshot.

use chrono::{DateTime, Utc};
use derive_more::Display;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which of the four persisted tables (spec.md §6) a record belongs to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Positions,
    Inventory,
    Limits,
    CalculationRules,
}

/// One durable log entry: enough to reconstruct a single cache record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
    pub table: Table,
    pub key: String,
    pub version: u64,
    pub payload: String,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only durable log abstraction. `InMemoryDurableLog` is the test
/// double used throughout this workspace; a production deployment backs
/// this with a real append-only store (Kafka compacted topic, WAL file,
/// etc.) - that adapter is an external collaborator, out of scope here.
pub trait DurableLog: Send + Sync {
    fn append(&self, record: Record);

    /// All records for `table`, oldest first, with only the latest version
    /// per key retained - replaying this reproduces the cache's final
    /// state for that table.
    fn replay(&self, table: Table) -> Vec<Record>;
}

#[derive(Default)]
pub struct InMemoryDurableLog {
    records: Mutex<Vec<Record>>,
}

impl InMemoryDurableLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableLog for InMemoryDurableLog {
    fn append(&self, record: Record) {
        self.records.lock().push(record);
    }

    fn replay(&self, table: Table) -> Vec<Record> {
        let records = self.records.lock();
        let mut latest: HashMap<String, Record> = HashMap::new();
        for record in records.iter().filter(|r| r.table == table) {
            latest
                .entry(record.key.clone())
                .and_modify(|existing| {
                    if record.version >= existing.version {
                        *existing = record.clone();
                    }
                })
                .or_insert_with(|| record.clone());
        }
        let mut result: Vec<Record> = latest.into_values().collect();
        result.sort_by(|a, b| a.key.cmp(&b.key));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, version: u64) -> Record {
        Record {
            table: Table::Positions,
            key: key.to_string(),
            version,
            payload: format!("payload-v{version}"),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn replay_keeps_only_the_latest_version_per_key() {
        let log = InMemoryDurableLog::new();
        log.append(record("k1", 1));
        log.append(record("k1", 2));
        log.append(record("k2", 1));

        let replayed = log.replay(Table::Positions);
        assert_eq!(replayed.len(), 2);
        let k1 = replayed.iter().find(|r| r.key == "k1").unwrap();
        assert_eq!(k1.version, 2);
        assert_eq!(k1.payload, "payload-v2");
    }

    #[test]
    fn replay_is_scoped_to_its_table() {
        let log = InMemoryDurableLog::new();
        log.append(record("k1", 1));
        let mut inventory_record = record("k2", 1);
        inventory_record.table = Table::Inventory;
        log.append(inventory_record);

        assert_eq!(log.replay(Table::Positions).len(), 1);
        assert_eq!(log.replay(Table::Inventory).len(), 1);
        assert_eq!(log.replay(Table::Limits).len(), 0);
    }
}
