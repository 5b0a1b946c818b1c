//! Engine orchestration
//!
//! [`RuleEngine`] validates the configuration, wires the bounded queues,
//! and spawns one [`RuleWorker`](worker::RuleWorker) task per configured
//! thread. Worker 0 is the master and carries the periodic aggregate-flush
//! duty; all workers share the DPI receive queue (consumer fan-out) and the
//! stats sink (producer fan-in) but nothing else.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::shutdown::ShutdownController;
use crate::engine::stats::{AggregateStats, StatsRecord};
use crate::error::{EngineError, Result};
use crate::fileio::{DirEntryKind, DirectoryReader};
use crate::queue::{bounded_record_queue, stats_queue, syslog_sink, RecordProducer};

pub mod retry;
pub mod shutdown;
pub mod stats;
pub mod worker;

pub use retry::RetryPolicy;
pub use shutdown::ShutdownSignal;
pub use stats::{StatsScope, WorkerCounters};
pub use worker::{RuleWorker, WorkerState};

/// Capacity of the rendered-output channel
const SYSLOG_SINK_CAPACITY: usize = 1024;
/// Capacity of the stats accumulator channel
const STATS_QUEUE_CAPACITY: usize = 1024;

/// The rule-processing engine
pub struct RuleEngine {
    config: EngineConfig,
    aggregate: Arc<AggregateStats>,
}

impl RuleEngine {
    /// Validate the configuration and prepare an engine
    ///
    /// Configuration faults are fatal here, before any worker enters its
    /// loop.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            aggregate: Arc::new(AggregateStats::new()),
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load the auxiliary protocol scripts, if a directory is configured
    ///
    /// Returns the script file names found. A configured but unreadable
    /// directory is a configuration fault.
    pub fn load_scripts(&self) -> Result<Vec<String>> {
        let Some(dir) = &self.config.scripts_dir else {
            return Ok(Vec::new());
        };
        let mut reader = DirectoryReader::new(dir).map_err(|e| {
            EngineError::Config(format!("cannot read scripts dir {}: {e}", dir.display()))
        })?;
        let mut scripts = Vec::new();
        loop {
            let (kind, name) = reader.next_entry();
            match kind {
                DirEntryKind::File => scripts.push(name),
                DirEntryKind::Directory | DirEntryKind::Unknown => continue,
                DirEntryKind::End => break,
            }
        }
        scripts.sort();
        info!(dir = %dir.display(), count = scripts.len(), "loaded protocol scripts");
        Ok(scripts)
    }

    /// Spawn the worker tasks and hand back the engine's queue endpoints
    pub fn start(self) -> Result<EngineHandle> {
        self.load_scripts()?;

        let (producer, source) = bounded_record_queue(self.config.dpi_queue_max_depth);
        let (sink, syslog_rx) = syslog_sink(SYSLOG_SINK_CAPACITY);
        let (stats_sink, stats_rx) = stats_queue(STATS_QUEUE_CAPACITY);
        let shutdown = ShutdownController::new();

        info!(
            workers = self.config.workers,
            dpi_endpoint = %self.config.dpi_receive_endpoint,
            stats_endpoint = %self.config.stats_endpoint,
            "starting rule engine"
        );

        let mut workers = Vec::with_capacity(self.config.workers);
        for thread_number in 0..self.config.workers {
            let worker_config = self.config.worker_config(thread_number as u32);
            let mut worker = RuleWorker::new(
                worker_config,
                source.clone(),
                sink.clone(),
                stats_sink.clone(),
                self.aggregate.clone(),
                shutdown.subscribe(),
            );
            if let Some(max) = self.config.max_syslog_msg_size {
                worker.set_max_syslog_msg_size(max);
            }
            workers.push(tokio::spawn(worker.run()));
        }

        Ok(EngineHandle {
            producer,
            syslog_rx,
            stats_rx,
            shutdown,
            workers,
            aggregate: self.aggregate,
        })
    }
}

/// Handle to a running engine
///
/// Owns the producer side of the DPI queue (handed to the external source),
/// the receiving ends of the output and stats queues (handed to the
/// downstream forwarders), and the shutdown controller.
pub struct EngineHandle {
    /// Producer side of the bounded DPI receive queue
    pub producer: RecordProducer,
    /// Rendered syslog/SIEM output
    pub syslog_rx: mpsc::Receiver<String>,
    /// Statistics records from all workers
    pub stats_rx: mpsc::Receiver<StatsRecord>,
    shutdown: ShutdownController,
    workers: Vec<JoinHandle<Result<()>>>,
    aggregate: Arc<AggregateStats>,
}

impl EngineHandle {
    /// Number of worker tasks
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Engine-wide aggregate counters
    pub fn aggregate(&self) -> &AggregateStats {
        &self.aggregate
    }

    /// Signal shutdown and wait for every worker to drain
    ///
    /// Workers finish their in-flight record; a worker that does not stop
    /// within `timeout` is aborted.
    pub async fn shutdown(self, timeout: Duration) -> Result<()> {
        info!("shutting down rule engine");
        self.shutdown.trigger();

        let mut first_error = None;
        for (i, mut handle) in self.workers.into_iter().enumerate() {
            match tokio::time::timeout(timeout, &mut handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(err))) => {
                    warn!(worker = i, %err, "worker stopped with error");
                    first_error.get_or_insert(err);
                }
                Ok(Err(join_err)) => {
                    warn!(worker = i, %join_err, "worker task panicked");
                    first_error.get_or_insert(EngineError::Config(format!(
                        "worker {i} panicked: {join_err}"
                    )));
                }
                Err(_) => {
                    warn!(worker = i, "worker did not drain within timeout, aborting");
                    handle.abort();
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}
