//! Network-traffic rule-processing engine
//!
//! `dpi-relay` consumes classified deep-packet-inspection (DPI) records
//! from a bounded receive queue, extracts a protocol-specific set of fields
//! from each record, and renders those fields into two downstream
//! representations: length-bounded syslog lines and structured SIEM
//! messages. Every processed record is accompanied by a best-effort
//! statistics push to a separate accumulator queue.
//!
//! # Example
//!
//! ```no_run
//! use dpi_relay::{AppProtocol, DpiRecord, EngineConfig, RuleEngine};
//! use std::time::Duration;
//!
//! # async fn example() -> dpi_relay::Result<()> {
//! let config = EngineConfig::builder()
//!     .workers(4)
//!     .siem_mode(true)
//!     .build()?;
//!
//! let mut handle = RuleEngine::new(config)?.start()?;
//!
//! handle
//!     .producer
//!     .send(DpiRecord::new(AppProtocol::Web).with_attribute("url", "http://x/y"))
//!     .await?;
//!
//! while let Some(line) = handle.syslog_rx.recv().await {
//!     println!("{line}");
//!     # break;
//! }
//!
//! handle.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

// Re-export commonly used items
pub use compose::{SiemComposer, SyslogComposer};
pub use config::{EngineConfig, EngineConfigBuilder, WorkerConfig, WorkerRole};
pub use engine::stats::{AggregateStats, StatsRecord};
pub use engine::{EngineHandle, RetryPolicy, RuleEngine, RuleWorker};
pub use error::{EngineError, Result, TransportError};
pub use fields::{IndexedFieldPairs, PairCursor};
pub use record::{AppProtocol, DpiRecord};

/// Message composers for the two output representations
pub mod compose;

/// Engine and per-worker configuration
pub mod config;

/// Worker orchestration, statistics and shutdown
pub mod engine;

/// Error types
pub mod error;

/// Ordered field-pair accumulation and the extractor set
pub mod fields;

/// Filesystem collaborator for script/config loading
pub mod fileio;

/// Queue transport contracts and channel-backed adapters
pub mod queue;

/// DPI record model
pub mod record;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing with an environment-driven filter
pub fn init_tracing(json_logs: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::from_default_env());
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
