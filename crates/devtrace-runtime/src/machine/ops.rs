//! Machine inputs, dispatched operations, and effects.
//!
//! The transition function consumes [`Input`]s and returns [`Effect`]s as
//! plain data; a separate runner executes them. This keeps the machine
//! synchronous and testable without mocking I/O.

use std::fmt;
use std::path::PathBuf;

use devtrace_core::command::Command;
use devtrace_core::context::ProviderConfig;
use devtrace_core::results::{
    AiSuggestion, AnalysisResult, FlowResult, HotswapResult, TraceResult,
};

/// Identity of one dispatched operation, monotonic per machine.
///
/// A completion is applied only if its id matches the machine's single
/// outstanding operation; anything else is a stale completion and is
/// discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op_{}", self.0)
    }
}

/// The asynchronous work a mode controller asked for.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationKind {
    /// Analyze a file (insight).
    Analyze {
        /// File to analyze.
        file: PathBuf,
    },
    /// Generate an execution-flow graph (flow).
    GenerateFlow {
        /// Function to visualize.
        function_name: String,
    },
    /// Run a trace session to completion (live trace). Long-lived; exempt
    /// from the per-operation timeout.
    StartTrace,
    /// Swap in new code (hotswap).
    PerformHotswap {
        /// Target recorded state.
        state_id: String,
        /// Replacement code.
        new_code: String,
    },
    /// Roll back to a recorded state (hotswap).
    Rollback {
        /// Target recorded state.
        state_id: String,
    },
    /// Apply a fix to a recorded state (hotswap).
    ApplyFix {
        /// Target recorded state.
        state_id: String,
        /// Replacement code.
        new_code: String,
    },
    /// Resume from a recorded state (hotswap).
    PlayForward {
        /// Target recorded state.
        state_id: String,
    },
    /// Fetch AI suggestions (insight).
    FetchSuggestions {
        /// Error to get suggestions for.
        error_message: String,
        /// File context for the provider.
        file: PathBuf,
        /// Provider configuration at dispatch time.
        config: ProviderConfig,
    },
    /// Apply one suggestion (insight).
    ApplySuggestion {
        /// File to edit.
        file: PathBuf,
        /// The chosen suggestion.
        suggestion: AiSuggestion,
    },
}

/// One dispatched operation: identity plus work.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationRequest {
    /// Operation identity.
    pub op: OpId,
    /// Work to perform.
    pub kind: OperationKind,
}

/// Successful output of a dispatched operation.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationOutput {
    /// Analysis finished.
    Analysis(AnalysisResult),
    /// Flow generation finished.
    Flow(FlowResult),
    /// Trace session ended.
    Trace(TraceResult),
    /// A hotswap operation finished.
    Hotswap(HotswapResult),
    /// Suggestion fetch finished.
    Suggestions(Vec<AiSuggestion>),
    /// Suggestion apply finished; `false` means the runtime declined.
    SuggestionApplied(bool),
}

/// Everything the machine reacts to, in one ordered queue.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    /// An external command.
    Command(Command),
    /// A dispatched operation resolved.
    Completion {
        /// Which operation.
        op: OpId,
        /// Success value or failure message.
        outcome: Result<OperationOutput, String>,
    },
    /// The live event stream failed upstream.
    StreamFailed {
        /// Failure description.
        message: String,
    },
}

/// Side effects requested by a transition, executed by the runner.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Start the requested operation on its own task.
    Dispatch(OperationRequest),
    /// Cancel the outstanding operation, if any.
    CancelOperation,
    /// Open the live event subscription.
    OpenEventStream,
    /// Release the live event subscription.
    CloseEventStream,
    /// Start runtime instrumentation.
    StartInstrumentation,
    /// Stop runtime instrumentation.
    StopInstrumentation,
}

/// Result of applying one input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Step {
    /// Effects to execute, in order.
    pub effects: Vec<Effect>,
    /// Whether state or context changed (drives observer notification).
    pub changed: bool,
}

impl Step {
    /// A no-op step: nothing changed, nothing to run.
    #[must_use]
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// A context/state change with no effects.
    #[must_use]
    pub fn changed() -> Self {
        Self {
            effects: Vec::new(),
            changed: true,
        }
    }

    /// A change accompanied by effects.
    #[must_use]
    pub fn with_effects(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            changed: true,
        }
    }
}
