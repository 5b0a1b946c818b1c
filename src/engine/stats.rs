//! Processing statistics
//!
//! Each worker emits one [`StatsRecord`] per processed DPI record to the
//! accumulator queue, best-effort. The master worker additionally flushes
//! an engine-wide aggregate snapshot on a timer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::record::AppProtocol;

/// Whether a stats record describes one worker or the whole engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsScope {
    /// Snapshot of one worker's counters after one record
    Record,
    /// Engine-wide aggregate flushed by the master worker
    Aggregate,
}

/// One statistics record pushed to the accumulator queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    /// Worker that produced this record
    pub thread_number: u32,
    /// Per-record snapshot or engine-wide aggregate
    pub scope: StatsScope,
    /// Records processed so far
    pub processed: u64,
    /// Records whose emission was skipped after a composition fault
    pub skipped: u64,
    /// Processed counts keyed by protocol family name
    pub by_protocol: BTreeMap<String, u64>,
    /// Total bytes of rendered output emitted
    pub bytes_emitted: u64,
    /// Stats records lost to a full or unreachable accumulator queue
    pub stats_dropped: u64,
}

/// Counters exclusively owned by one worker, snapshotted after each record
#[derive(Debug, Default)]
pub struct WorkerCounters {
    /// Records processed by this worker
    pub processed: u64,
    /// Records skipped after a composition fault
    pub skipped: u64,
    /// Bytes of rendered output emitted by this worker
    pub bytes_emitted: u64,
    /// Processed counts per protocol family
    pub by_protocol: BTreeMap<String, u64>,
}

impl WorkerCounters {
    /// Record one processed record of the given protocol
    pub fn record_processed(&mut self, protocol: AppProtocol, bytes: u64) {
        self.processed += 1;
        self.bytes_emitted += bytes;
        *self
            .by_protocol
            .entry(protocol.as_str().to_string())
            .or_insert(0) += 1;
    }

    /// Build the per-record stats snapshot for this worker
    pub fn snapshot(&self, thread_number: u32, stats_dropped: u64) -> StatsRecord {
        StatsRecord {
            thread_number,
            scope: StatsScope::Record,
            processed: self.processed,
            skipped: self.skipped,
            by_protocol: self.by_protocol.clone(),
            bytes_emitted: self.bytes_emitted,
            stats_dropped,
        }
    }
}

/// Engine-wide counters shared by all workers
///
/// Field-pair and configuration state is never shared; these atomics are the
/// only cross-worker state and exist solely for the master's aggregate duty.
#[derive(Debug, Default)]
pub struct AggregateStats {
    processed: AtomicU64,
    skipped: AtomicU64,
    bytes_emitted: AtomicU64,
    stats_dropped: AtomicU64,
    by_protocol: [AtomicU64; AppProtocol::ALL.len()],
}

impl AggregateStats {
    /// Create zeroed aggregate counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one processed record into the aggregate
    pub fn record_processed(&self, protocol: AppProtocol, bytes: u64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_emitted.fetch_add(bytes, Ordering::Relaxed);
        self.by_protocol[protocol.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Count one record skipped after a composition fault
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one stats record lost to a full accumulator queue
    pub fn record_stats_dropped(&self) {
        self.stats_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Total records processed engine-wide
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Total stats records dropped engine-wide
    pub fn stats_dropped(&self) -> u64 {
        self.stats_dropped.load(Ordering::Relaxed)
    }

    /// Build the aggregate snapshot flushed by the master worker
    pub fn snapshot(&self, thread_number: u32) -> StatsRecord {
        let mut by_protocol = BTreeMap::new();
        for protocol in AppProtocol::ALL {
            let count = self.by_protocol[protocol.index()].load(Ordering::Relaxed);
            if count > 0 {
                by_protocol.insert(protocol.as_str().to_string(), count);
            }
        }
        StatsRecord {
            thread_number,
            scope: StatsScope::Aggregate,
            processed: self.processed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            by_protocol,
            bytes_emitted: self.bytes_emitted.load(Ordering::Relaxed),
            stats_dropped: self.stats_dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_counters_track_per_protocol() {
        let mut counters = WorkerCounters::default();
        counters.record_processed(AppProtocol::Web, 100);
        counters.record_processed(AppProtocol::Web, 50);
        counters.record_processed(AppProtocol::Mail, 10);

        let snapshot = counters.snapshot(3, 1);
        assert_eq!(snapshot.thread_number, 3);
        assert_eq!(snapshot.scope, StatsScope::Record);
        assert_eq!(snapshot.processed, 3);
        assert_eq!(snapshot.bytes_emitted, 160);
        assert_eq!(snapshot.by_protocol.get("web"), Some(&2));
        assert_eq!(snapshot.by_protocol.get("mail"), Some(&1));
        assert_eq!(snapshot.stats_dropped, 1);
    }

    #[test]
    fn aggregate_snapshot_omits_zero_protocols() {
        let aggregate = AggregateStats::new();
        aggregate.record_processed(AppProtocol::Chat, 42);
        aggregate.record_skipped();

        let snapshot = aggregate.snapshot(0);
        assert_eq!(snapshot.scope, StatsScope::Aggregate);
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.skipped, 1);
        assert_eq!(snapshot.by_protocol.len(), 1);
        assert_eq!(snapshot.by_protocol.get("chat"), Some(&1));
    }

    #[test]
    fn stats_record_round_trips_through_json() {
        let mut counters = WorkerCounters::default();
        counters.record_processed(AppProtocol::Command, 7);
        let record = counters.snapshot(1, 0);
        let bytes = serde_json::to_vec(&record).unwrap();
        let back: StatsRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, record);
    }
}
