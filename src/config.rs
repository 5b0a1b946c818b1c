//! Engine and worker configuration
//!
//! An [`EngineConfig`] describes the whole engine and is validated before
//! any worker enters its loop; each worker then receives its own immutable
//! [`WorkerConfig`], never shared or mutated after construction.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::retry::RetryPolicy;
use crate::error::{EngineError, Result};
use crate::queue::QueueEndpoint;

/// Default DPI receive queue endpoint
pub const DEFAULT_DPI_ENDPOINT: &str = "ipc:///tmp/dpilrmsgtest.ipc";
/// Default statistics accumulator endpoint
pub const DEFAULT_STATS_ENDPOINT: &str = "ipc:///tmp/statsAccumulatorQ.ipc";
/// Default per-line cap for syslog output
pub const DEFAULT_MAX_LINE_LENGTH: usize = 2048;
/// Default maximum depth of the DPI receive queue
pub const DEFAULT_DPI_QUEUE_MAX_DEPTH: usize = 1000;

/// Role assigned to one worker at construction, never mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    /// Performs engine-wide duties such as the periodic aggregate flush
    Master,
    /// Processes individual records only
    Slave,
}

impl WorkerRole {
    /// Whether this worker carries the master duties
    pub fn is_master(&self) -> bool {
        matches!(self, WorkerRole::Master)
    }
}

/// Engine-wide configuration, validated before any worker starts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker tasks; worker 0 is the master
    pub workers: usize,
    /// DPI receive queue endpoint
    pub dpi_receive_endpoint: String,
    /// Statistics accumulator endpoint
    pub stats_endpoint: String,
    /// Maximum depth of the DPI receive queue
    pub dpi_queue_max_depth: usize,
    /// Enable the SIEM composition path
    pub siem_mode: bool,
    /// Verbose diagnostic SIEM rendering
    pub siem_debug_mode: bool,
    /// Gate for emitting syslog lines at all
    pub syslog_enabled: bool,
    /// Per-line cap for syslog output
    pub max_line_length: usize,
    /// Optional cumulative cap for one record's syslog output
    pub max_syslog_msg_size: Option<usize>,
    /// Directory holding auxiliary protocol-specific scripts
    pub scripts_dir: Option<PathBuf>,
    /// Syslog facility passed through to the sink
    pub facility: i32,
    /// Syslog priority passed through to the sink
    pub priority: i32,
    /// Syslog option bits passed through to the sink
    pub option: i32,
    /// Interval between the master's aggregate flushes
    pub aggregate_flush_interval: Duration,
    /// Receive-side retry policy
    pub retry_policy: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            dpi_receive_endpoint: DEFAULT_DPI_ENDPOINT.to_string(),
            stats_endpoint: DEFAULT_STATS_ENDPOINT.to_string(),
            dpi_queue_max_depth: DEFAULT_DPI_QUEUE_MAX_DEPTH,
            siem_mode: false,
            siem_debug_mode: false,
            syslog_enabled: true,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_syslog_msg_size: None,
            scripts_dir: None,
            facility: 1,
            priority: 6,
            option: 0,
            aggregate_flush_interval: Duration::from_secs(60),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Fluent builder for a validated configuration
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &std::path::Path) -> Result<Self> {
        let content = crate::fileio::read_ascii_file_content(path);
        if content.has_failed() {
            return Err(EngineError::Config(format!(
                "cannot read config file {}: {}",
                path.display(),
                content.error
            )));
        }
        let config: Self = serde_yaml::from_str(&content.result)
            .map_err(|e| EngineError::Config(format!("invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every field; a configuration fault is fatal and reported
    /// before any worker enters its loop
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(EngineError::Config("workers must be > 0".to_string()));
        }
        if self.dpi_queue_max_depth == 0 {
            return Err(EngineError::Config(
                "dpi_queue_max_depth must be > 0".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(EngineError::Config("max_line_length must be > 0".to_string()));
        }
        QueueEndpoint::parse(&self.dpi_receive_endpoint)
            .map_err(|e| EngineError::Config(e.to_string()))?;
        QueueEndpoint::parse(&self.stats_endpoint)
            .map_err(|e| EngineError::Config(e.to_string()))?;
        self.retry_policy.validate().map_err(EngineError::Config)?;
        if let Some(dir) = &self.scripts_dir {
            if !crate::fileio::directory_exists(dir) {
                return Err(EngineError::Config(format!(
                    "scripts directory does not exist: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Derive the immutable per-worker configuration for `thread_number`
    ///
    /// Worker 0 is the master; every other worker is a slave.
    pub fn worker_config(&self, thread_number: u32) -> WorkerConfig {
        WorkerConfig {
            thread_number,
            role: if thread_number == 0 {
                WorkerRole::Master
            } else {
                WorkerRole::Slave
            },
            siem_mode: self.siem_mode,
            siem_debug_mode: self.siem_debug_mode,
            syslog_enabled: self.syslog_enabled,
            max_line_length: self.max_line_length,
            scripts_dir: self.scripts_dir.clone(),
            stats_endpoint: self.stats_endpoint.clone(),
            dpi_receive_endpoint: self.dpi_receive_endpoint.clone(),
            dpi_queue_max_depth: self.dpi_queue_max_depth,
            facility: self.facility,
            priority: self.priority,
            option: self.option,
            aggregate_flush_interval: self.aggregate_flush_interval,
            retry_policy: self.retry_policy.clone(),
        }
    }
}

/// Fluent builder for [`EngineConfig`]
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Number of worker tasks
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// DPI receive queue endpoint
    pub fn dpi_receive_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.dpi_receive_endpoint = endpoint.into();
        self
    }

    /// Statistics accumulator endpoint
    pub fn stats_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.stats_endpoint = endpoint.into();
        self
    }

    /// Maximum depth of the DPI receive queue
    pub fn dpi_queue_max_depth(mut self, depth: usize) -> Self {
        self.config.dpi_queue_max_depth = depth;
        self
    }

    /// Enable the SIEM composition path
    pub fn siem_mode(mut self, enabled: bool) -> Self {
        self.config.siem_mode = enabled;
        self
    }

    /// Verbose diagnostic SIEM rendering
    pub fn siem_debug_mode(mut self, enabled: bool) -> Self {
        self.config.siem_debug_mode = enabled;
        self
    }

    /// Gate for emitting syslog lines
    pub fn syslog_enabled(mut self, enabled: bool) -> Self {
        self.config.syslog_enabled = enabled;
        self
    }

    /// Per-line cap for syslog output
    pub fn max_line_length(mut self, max: usize) -> Self {
        self.config.max_line_length = max;
        self
    }

    /// Cumulative cap for one record's syslog output
    pub fn max_syslog_msg_size(mut self, max: usize) -> Self {
        self.config.max_syslog_msg_size = Some(max);
        self
    }

    /// Directory holding auxiliary protocol scripts
    pub fn scripts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scripts_dir = Some(dir.into());
        self
    }

    /// Interval between the master's aggregate flushes
    pub fn aggregate_flush_interval(mut self, interval: Duration) -> Self {
        self.config.aggregate_flush_interval = interval;
        self
    }

    /// Receive-side retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry_policy = policy;
        self
    }

    /// Validate and return the finished configuration
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Immutable per-worker configuration
///
/// Owned exclusively by its worker; never mutated by another thread.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Zero-based worker index
    pub thread_number: u32,
    /// Master or slave, decided once at construction
    pub role: WorkerRole,
    /// Enable the SIEM composition path
    pub siem_mode: bool,
    /// Verbose diagnostic SIEM rendering
    pub siem_debug_mode: bool,
    /// Gate for emitting syslog lines
    pub syslog_enabled: bool,
    /// Per-line cap for syslog output
    pub max_line_length: usize,
    /// Directory holding auxiliary protocol scripts
    pub scripts_dir: Option<PathBuf>,
    /// Statistics accumulator endpoint
    pub stats_endpoint: String,
    /// DPI receive queue endpoint
    pub dpi_receive_endpoint: String,
    /// Maximum depth of the DPI receive queue
    pub dpi_queue_max_depth: usize,
    /// Syslog facility
    pub facility: i32,
    /// Syslog priority
    pub priority: i32,
    /// Syslog option bits
    pub option: i32,
    /// Interval between aggregate flushes (master only)
    pub aggregate_flush_interval: Duration,
    /// Receive-side retry policy
    pub retry_policy: RetryPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        EngineConfig::default().worker_config(0)
    }
}
