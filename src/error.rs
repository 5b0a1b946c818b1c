//! Error types for the rule-processing engine

use thiserror::Error;

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level engine error taxonomy
///
/// Expected field absence is not represented here at all: extractors skip
/// missing attributes as a normal condition. Composer faults are reported
/// through a boolean result and only surface as [`EngineError::Compose`]
/// when a caller chooses to escalate them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration detected before any worker starts
    #[error("configuration error: {0}")]
    Config(String),

    /// Queue transport failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A composer could not render a message for one record
    #[error("compose error: {0}")]
    Compose(String),

    /// The receive queue stayed unreachable through the whole retry budget
    #[error("receive queue failed after {attempts} attempts: {reason}")]
    ReceiveExhausted {
        /// Number of pull attempts made before giving up
        attempts: u32,
        /// Description of the last observed failure
        reason: String,
    },

    /// Filesystem failure while loading auxiliary scripts or config
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the queue transport adapters
#[derive(Debug, Error)]
pub enum TransportError {
    /// The queue has been closed; no further messages will arrive
    #[error("queue closed")]
    Closed,

    /// The bounded queue is at capacity and rejected the push
    #[error("queue full")]
    Full,

    /// The endpoint string could not be parsed
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}
