//! Runtime error types.
//!
//! Failures never cross the orchestrator boundary as panics: everything that
//! goes wrong inside a mode becomes an error transition with a message in
//! the context. These types exist for the public API surface (`send`,
//! `shutdown`) and for uniform message formatting inside the machine.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the orchestration runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The orchestrator's command channel is closed (loop has shut down).
    #[error("orchestrator is not running")]
    ChannelClosed,

    /// A dispatched operation failed.
    #[error("operation failed: {0}")]
    Operation(String),

    /// A required context field was absent when an operation was about to
    /// be dispatched.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A dispatched operation exceeded the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The live event stream failed upstream.
    #[error("live event stream failed: {0}")]
    Stream(String),
}
