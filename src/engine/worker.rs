//! Rule-engine worker loop
//!
//! Each worker is an independent sequential loop bound to the shared DPI
//! receive queue and the shared stats sink:
//!
//! ```text
//! Idle -> Receiving -> Extracting -> Composing -> Emitting -> Idle
//!   \-> Draining -> Stopped   (on shutdown)
//! ```
//!
//! Extraction and composition are pure, non-blocking transformations; the
//! only suspension points are the queue pull and the syslog push. A
//! malformed record never stops the pipeline: the worker logs, counts the
//! skip, and continues. Stats delivery is best-effort and its loss never
//! blocks message delivery.

use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::compose::{SiemComposer, SyslogComposer};
use crate::config::WorkerConfig;
use crate::engine::shutdown::ShutdownSignal;
use crate::engine::stats::{AggregateStats, WorkerCounters};
use crate::error::{EngineError, Result};
use crate::fields::{application_field_pairs, siem_required_field_pairs, IndexedFieldPairs};
use crate::queue::{MessageSink, RecordSource, StatsSink};
use crate::record::DpiRecord;

/// Observable worker states, mirroring the processing loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Between records
    Idle,
    /// Blocked on the DPI receive queue
    Receiving,
    /// Running the extractor passes
    Extracting,
    /// Building syslog/SIEM output
    Composing,
    /// Pushing output and stats
    Emitting,
    /// Shutdown observed, finishing the in-flight record
    Draining,
    /// Loop exited
    Stopped,
}

enum LoopEvent {
    Shutdown,
    Flush,
    Pulled(Option<DpiRecord>),
}

impl WorkerState {
    /// Stable name for logging
    pub fn name(&self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Receiving => "receiving",
            WorkerState::Extracting => "extracting",
            WorkerState::Composing => "composing",
            WorkerState::Emitting => "emitting",
            WorkerState::Draining => "draining",
            WorkerState::Stopped => "stopped",
        }
    }
}

/// One rule-engine worker
///
/// Owns its configuration and composers exclusively; the only state shared
/// with other workers is the aggregate counter block.
pub struct RuleWorker<S, M, K>
where
    S: RecordSource,
    M: MessageSink,
    K: StatsSink,
{
    config: WorkerConfig,
    source: S,
    syslog_sink: M,
    stats_sink: K,
    syslog: SyslogComposer,
    siem: SiemComposer,
    shutdown: ShutdownSignal,
    aggregate: Arc<AggregateStats>,
    counters: WorkerCounters,
    stats_dropped: u64,
    state: WorkerState,
}

impl<S, M, K> RuleWorker<S, M, K>
where
    S: RecordSource,
    M: MessageSink,
    K: StatsSink,
{
    /// Create a worker from its immutable configuration and queue handles
    pub fn new(
        config: WorkerConfig,
        source: S,
        syslog_sink: M,
        stats_sink: K,
        aggregate: Arc<AggregateStats>,
        shutdown: ShutdownSignal,
    ) -> Self {
        let syslog = SyslogComposer::new(config.max_line_length);
        let siem = SiemComposer::new(config.siem_debug_mode);
        Self {
            config,
            source,
            syslog_sink,
            stats_sink,
            syslog,
            siem,
            shutdown,
            aggregate,
            counters: WorkerCounters::default(),
            stats_dropped: 0,
            state: WorkerState::Idle,
        }
    }

    /// Late-bound cap on one record's cumulative syslog output
    ///
    /// Must be called before [`RuleWorker::run`]; the field is not
    /// thread-shared.
    pub fn set_max_syslog_msg_size(&mut self, max: usize) {
        self.syslog.set_max_msg_size(max);
    }

    /// Current loop state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Immutable view of this worker's configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run the worker loop until shutdown or a fatal transport fault
    pub async fn run(mut self) -> Result<()> {
        info!(
            thread = self.config.thread_number,
            role = ?self.config.role,
            "worker starting"
        );

        let mut flush_interval = self.config.role.is_master().then(|| {
            let mut interval = tokio::time::interval(self.config.aggregate_flush_interval);
            // the first tick fires immediately; skip it
            interval.reset();
            interval
        });
        let retry = self.config.retry_policy.clone();
        let mut failed_pulls: u32 = 0;

        loop {
            self.state = WorkerState::Receiving;
            let mut shutdown = self.shutdown.clone();

            let event = match &mut flush_interval {
                Some(interval) => {
                    tokio::select! {
                        _ = shutdown.triggered() => LoopEvent::Shutdown,
                        _ = interval.tick() => LoopEvent::Flush,
                        record = self.source.pull() => LoopEvent::Pulled(record),
                    }
                }
                None => {
                    tokio::select! {
                        _ = shutdown.triggered() => LoopEvent::Shutdown,
                        record = self.source.pull() => LoopEvent::Pulled(record),
                    }
                }
            };

            let pulled = match event {
                LoopEvent::Shutdown => break,
                LoopEvent::Flush => {
                    self.flush_aggregate();
                    continue;
                }
                LoopEvent::Pulled(record) => record,
            };

            match pulled {
                Some(record) => {
                    failed_pulls = 0;
                    self.process_record(record).await;
                    self.state = WorkerState::Idle;
                }
                None => {
                    if self.shutdown.is_triggered() {
                        break;
                    }
                    failed_pulls += 1;
                    if failed_pulls >= retry.max_attempts {
                        self.state = WorkerState::Stopped;
                        error!(
                            thread = self.config.thread_number,
                            attempts = failed_pulls,
                            "receive queue unreachable, stopping worker"
                        );
                        return Err(EngineError::ReceiveExhausted {
                            attempts: failed_pulls,
                            reason: "receive queue closed".to_string(),
                        });
                    }
                    let backoff = retry.backoff(failed_pulls - 1);
                    warn!(
                        thread = self.config.thread_number,
                        attempt = failed_pulls,
                        ?backoff,
                        "receive queue closed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        self.state = WorkerState::Draining;
        debug!(thread = self.config.thread_number, "draining");
        if self.config.role.is_master() {
            self.flush_aggregate();
        }
        self.state = WorkerState::Stopped;
        info!(
            thread = self.config.thread_number,
            processed = self.counters.processed,
            "worker stopped"
        );
        Ok(())
    }

    /// Run extraction, composition and emission for one pulled record
    async fn process_record(&mut self, record: DpiRecord) {
        self.state = WorkerState::Extracting;
        let mut pairs = IndexedFieldPairs::new();
        let dynamic_start = siem_required_field_pairs(&record, &mut pairs);
        application_field_pairs(dynamic_start, &record, &mut pairs);
        trace!(
            thread = self.config.thread_number,
            session = %record.session_id,
            fields = pairs.len(),
            "extracted field pairs"
        );

        self.state = WorkerState::Composing;
        let mut syslog_lines = Vec::new();
        let mut compose_fault = false;
        if self.config.syslog_enabled
            && !self
                .syslog
                .syslog_messages(&pairs, &mut syslog_lines, dynamic_start)
        {
            warn!(
                thread = self.config.thread_number,
                session = %record.session_id,
                "syslog composition fault, skipping emission"
            );
            compose_fault = true;
            syslog_lines.clear();
        }
        let siem_messages = if self.config.siem_mode {
            self.siem.siem_message(&record)
        } else {
            Vec::new()
        };

        self.state = WorkerState::Emitting;
        let mut bytes_emitted = 0u64;
        if !compose_fault {
            for line in syslog_lines {
                bytes_emitted += line.len() as u64;
                if let Err(err) = self.syslog_sink.push(line).await {
                    warn!(
                        thread = self.config.thread_number,
                        %err,
                        "syslog sink rejected a line"
                    );
                    break;
                }
            }
            for message in siem_messages {
                bytes_emitted += message.len() as u64;
                if let Err(err) = self.syslog_sink.push(message).await {
                    warn!(
                        thread = self.config.thread_number,
                        %err,
                        "sink rejected a SIEM message"
                    );
                    break;
                }
            }
        }

        if compose_fault {
            self.counters.skipped += 1;
            self.aggregate.record_skipped();
        } else {
            self.counters.record_processed(record.protocol, bytes_emitted);
            self.aggregate.record_processed(record.protocol, bytes_emitted);
        }

        // One stats record per DPI record, always, best-effort.
        let snapshot = self
            .counters
            .snapshot(self.config.thread_number, self.stats_dropped);
        if !self.stats_sink.offer(snapshot) {
            self.stats_dropped += 1;
            self.aggregate.record_stats_dropped();
        }
    }

    fn flush_aggregate(&mut self) {
        let snapshot = self.aggregate.snapshot(self.config.thread_number);
        debug!(
            processed = snapshot.processed,
            skipped = snapshot.skipped,
            "flushing aggregate stats"
        );
        if !self.stats_sink.offer(snapshot) {
            self.stats_dropped += 1;
            self.aggregate.record_stats_dropped();
        }
    }
}
