//! # devtrace-runtime
//!
//! Mode orchestration: the hierarchical state machine and its async runner.
//!
//! - **Machine**: Pure transition function over modes, sub-states, and context
//! - **Orchestrator**: Single-task event loop; serializes every input, executes effects
//! - **Dispatcher**: Runs operations against the backend on their own tasks
//! - **Ingestor**: Pulls live trace events and feeds them into the input queue
//! - **Notifier**: Broadcasts state snapshots to observers
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: devtrace-core.
//! Depended on by: devtrace-backend (for the collaborator traits).

#![deny(unsafe_code)]

pub mod client;
pub mod dispatcher;
pub mod errors;
pub mod ingestor;
pub mod machine;
pub mod notifier;
pub mod orchestrator;

// Re-export main public API
pub use client::{ClientError, ClientResult, LiveEventSource, LiveEventStream, RuntimeClient};
pub use errors::RuntimeError;
pub use machine::{Effect, Input, Machine, ModeState, OpId, OperationKind, OperationOutput, Step};
pub use notifier::StateNotifier;
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorHandle};
