//! Collaborator traits the dispatcher invokes.
//!
//! [`RuntimeClient`] covers the request/response operations (analysis, flow
//! generation, hotswap, AI suggestions, instrumentation control) and the
//! long-lived trace session. [`LiveEventSource`] is the push-style live
//! event capability, independent of any rendering surface. Implementations
//! own the transport; the runtime only sequences calls and routes results.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use devtrace_core::context::ProviderConfig;
use devtrace_core::events::RawLiveEvent;
use devtrace_core::results::{
    AiSuggestion, AnalysisResult, FlowResult, HotswapResult, TraceResult,
};

/// Transport-level error from a collaborator.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for collaborator operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Stream of raw live events, closed by dropping it.
pub type LiveEventStream = BoxStream<'static, ClientResult<RawLiveEvent>>;

/// Request/response operations against the DevTrace runtime backend.
///
/// Each method is invoked at most once per controller activation, on its own
/// task, and must not touch orchestrator state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Analyze a file, returning found issues.
    async fn analyze(&self, file: &Path) -> ClientResult<AnalysisResult>;

    /// Generate the execution-flow graph for a function.
    async fn generate_flow(&self, function_name: &str) -> ClientResult<FlowResult>;

    /// Run a trace session to completion.
    ///
    /// Long-lived: resolves when the session ends on its own or when
    /// `cancel` fires. Live events arrive separately via
    /// [`LiveEventSource`].
    async fn start_trace(&self, cancel: CancellationToken) -> ClientResult<TraceResult>;

    /// Swap in new code for a recorded state.
    async fn perform_hotswap(&self, state_id: &str, new_code: &str) -> ClientResult<HotswapResult>;

    /// Roll back to a recorded state.
    async fn rollback(&self, state_id: &str) -> ClientResult<HotswapResult>;

    /// Apply a fix against a recorded state.
    async fn apply_fix(&self, state_id: &str, new_code: &str) -> ClientResult<HotswapResult>;

    /// Resume execution from a recorded state.
    async fn play_forward(&self, state_id: &str) -> ClientResult<HotswapResult>;

    /// Fetch AI suggestions for an error in a file.
    async fn fetch_suggestions(
        &self,
        error_message: &str,
        file: &Path,
        config: &ProviderConfig,
    ) -> ClientResult<Vec<AiSuggestion>>;

    /// Apply one suggestion to a file. `Ok(false)` means the runtime
    /// declined the edit.
    async fn apply_suggestion(&self, file: &Path, suggestion: &AiSuggestion) -> ClientResult<bool>;

    /// Start runtime instrumentation (entering insight or live-trace mode).
    async fn start_instrumentation(&self) -> ClientResult<()>;

    /// Stop runtime instrumentation (leaving insight or live-trace mode).
    async fn stop_instrumentation(&self) -> ClientResult<()>;
}

/// Push-style source of live trace events.
///
/// The subscription's lifetime is bound exactly to the `tracing` sub-state:
/// the returned stream is dropped on every exit path, releasing the
/// underlying handle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveEventSource: Send + Sync {
    /// Open the event stream.
    async fn subscribe(&self) -> ClientResult<LiveEventStream>;
}
