//! Queue I/O adapters
//!
//! The wire transport for DPI records and statistics is an external
//! collaborator; this module specifies only its contract. [`RecordSource`]
//! is the blocking pull side of the shared DPI receive queue,
//! [`MessageSink`] carries rendered output downstream, and [`StatsSink`] is
//! the best-effort accumulator fan-in whose losses must never block message
//! delivery. Channel-backed implementations over bounded `tokio::sync::mpsc`
//! queues live in [`channel`].

use async_trait::async_trait;

use crate::engine::stats::StatsRecord;
use crate::error::TransportError;
use crate::record::DpiRecord;

pub mod channel;

pub use channel::{
    bounded_record_queue, stats_queue, syslog_sink, ChannelMessageSink, ChannelRecordSource,
    ChannelStatsSink, RecordProducer,
};

/// Pull side of the shared DPI receive queue
///
/// Multiple workers consume from the same source; the transport load-balances
/// records across them. `pull` suspends until a record arrives and returns
/// `None` once the queue is closed.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Pull one decoded record, or `None` on close/shutdown
    async fn pull(&self) -> Option<DpiRecord>;
}

/// Sink for rendered syslog/SIEM text
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Push one rendered message downstream
    async fn push(&self, message: String) -> Result<(), TransportError>;
}

/// Best-effort statistics sink
///
/// A full or unreachable accumulator is tolerated: `offer` never blocks and
/// reports loss through its return value only.
pub trait StatsSink: Send + Sync {
    /// Offer one stats record; `false` means the record was dropped
    fn offer(&self, record: StatsRecord) -> bool;
}

/// Endpoint schemes the transport collaborator accepts
const ENDPOINT_SCHEMES: [&str; 2] = ["ipc://", "tcp://"];

/// Validated queue endpoint address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEndpoint(String);

impl QueueEndpoint {
    /// Parse and validate an endpoint string such as `ipc:///tmp/dpi.ipc`
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let valid = ENDPOINT_SCHEMES
            .iter()
            .any(|scheme| raw.len() > scheme.len() && raw.starts_with(scheme));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(TransportError::InvalidEndpoint(raw.to_string()))
        }
    }

    /// The validated address
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
