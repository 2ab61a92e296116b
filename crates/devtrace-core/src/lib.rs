//! # devtrace-core
//!
//! Foundation types for the DevTrace orchestration core.
//!
//! This crate provides the shared vocabulary that the runtime and backend
//! crates depend on:
//!
//! - **Context**: [`context::Context`] — the single aggregate of accumulated
//!   state owned by the orchestrator, plus [`context::ProviderConfig`] and
//!   the append-only [`context::HotswapHistoryEntry`] audit record
//! - **Live events**: [`events::LiveEvent`] and the partial wire form
//!   [`events::RawLiveEvent`] it is normalized from
//! - **Results**: per-mode result records ([`results::AnalysisResult`],
//!   [`results::FlowResult`], [`results::TraceResult`],
//!   [`results::HotswapResult`]) and [`results::AiSuggestion`]
//! - **Commands**: [`command::Command`] — the closed inbound union; unknown
//!   kinds are rejected at the deserialization boundary
//! - **Snapshots**: [`snapshot::StateSnapshot`] pushed to observers on every
//!   context change
//! - **Logging**: [`logging::init`] tracing-subscriber setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `devtrace-runtime` and
//! `devtrace-backend`.

#![deny(unsafe_code)]

pub mod command;
pub mod context;
pub mod events;
pub mod logging;
pub mod results;
pub mod snapshot;

pub use command::Command;
pub use context::{AiProvider, Context, HotswapHistoryEntry, ProviderConfig};
pub use events::{LiveEvent, LiveEventKind, RawLiveEvent, SourceLocation};
pub use results::{
    AiSuggestion, AnalysisResult, FlowEdge, FlowNode, FlowResult, HotswapResult, Issue, Severity,
    SuggestionCategory, SuggestionImpact, TraceResult,
};
pub use snapshot::{Mode, StateSnapshot, SubMode};
