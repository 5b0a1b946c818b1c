//! Bounded-channel transport implementations
//!
//! In-process stand-ins for the IPC transport, built on bounded
//! `tokio::sync::mpsc` queues. The record queue enforces the configured
//! maximum depth: at capacity the producer observes backpressure (an
//! awaited `send` or an explicit `try_send` rejection), never the consumer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::engine::stats::StatsRecord;
use crate::error::TransportError;
use crate::queue::{MessageSink, RecordSource, StatsSink};
use crate::record::DpiRecord;

/// Create the bounded DPI receive queue with the given maximum depth
pub fn bounded_record_queue(max_depth: usize) -> (RecordProducer, ChannelRecordSource) {
    let (tx, rx) = mpsc::channel(max_depth);
    (
        RecordProducer { tx },
        ChannelRecordSource {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Create the bounded syslog output sink and its receiving end
pub fn syslog_sink(capacity: usize) -> (ChannelMessageSink, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelMessageSink { tx }, rx)
}

/// Create the bounded stats queue and its receiving end
pub fn stats_queue(capacity: usize) -> (ChannelStatsSink, mpsc::Receiver<StatsRecord>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        ChannelStatsSink {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

/// Producer handle for the DPI receive queue
///
/// Owned by the external DPI source; the engine only consumes.
#[derive(Debug, Clone)]
pub struct RecordProducer {
    tx: mpsc::Sender<DpiRecord>,
}

impl RecordProducer {
    /// Push one record, waiting while the queue is at capacity
    pub async fn send(&self, record: DpiRecord) -> Result<(), TransportError> {
        self.tx.send(record).await.map_err(|_| TransportError::Closed)
    }

    /// Push one record without waiting; rejected when the queue is full
    pub fn try_send(&self, record: DpiRecord) -> Result<(), TransportError> {
        self.tx.try_send(record).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Shared multi-consumer pull side of the DPI receive queue
#[derive(Debug, Clone)]
pub struct ChannelRecordSource {
    rx: Arc<Mutex<mpsc::Receiver<DpiRecord>>>,
}

#[async_trait]
impl RecordSource for ChannelRecordSource {
    async fn pull(&self) -> Option<DpiRecord> {
        self.rx.lock().await.recv().await
    }
}

/// Channel-backed syslog sink
#[derive(Debug, Clone)]
pub struct ChannelMessageSink {
    tx: mpsc::Sender<String>,
}

#[async_trait]
impl MessageSink for ChannelMessageSink {
    async fn push(&self, message: String) -> Result<(), TransportError> {
        self.tx.send(message).await.map_err(|_| TransportError::Closed)
    }
}

/// Best-effort channel-backed stats sink shared by all workers
#[derive(Debug, Clone)]
pub struct ChannelStatsSink {
    tx: mpsc::Sender<StatsRecord>,
    dropped: Arc<AtomicU64>,
}

impl ChannelStatsSink {
    /// Stats records dropped because the queue was full or closed
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl StatsSink for ChannelStatsSink {
    fn offer(&self, record: StatsRecord) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => true,
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(%err, "stats record dropped");
                false
            }
        }
    }
}
