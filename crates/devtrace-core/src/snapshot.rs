//! Observer-facing state snapshots.
//!
//! On every context change the orchestrator pushes a [`StateSnapshot`] to
//! all subscribers. The snapshot is self-contained — mode, sub-state, and a
//! full clone of the context — so observers never read shared state.

use serde::{Deserialize, Serialize};

use crate::context::Context;

/// Top-level operating mode. Exactly one is active at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// No mode active.
    #[default]
    #[serde(rename = "idle")]
    Idle,
    /// Aggregating and analyzing runtime issues.
    #[serde(rename = "insightMode")]
    Insight,
    /// Visualizing execution flow.
    #[serde(rename = "flowMode")]
    Flow,
    /// Capturing real-time diagnostics.
    #[serde(rename = "liveTraceMode")]
    LiveTrace,
    /// Applying live code patches.
    #[serde(rename = "hotswapMode")]
    Hotswap,
}

/// Sub-state within an active mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubMode {
    /// Mode entered, no operation dispatched yet.
    Idle,
    /// Analysis operation in flight (insight).
    Analyzing,
    /// Analysis results available (insight).
    Results,
    /// Suggestion fetch in flight (insight).
    FetchingSuggestions,
    /// Suggestions available (insight).
    SuggestionsReceived,
    /// Suggestion apply in flight (insight).
    ApplyingSuggestion,
    /// Flow generation in flight (flow).
    Processing,
    /// Trace session active, ingesting events (live trace).
    Tracing,
    /// Operation finished (flow, live trace, hotswap).
    Completed,
    /// Hotswap operation in flight (hotswap).
    Swapping,
    /// Last operation failed; stable until the user acts.
    Error,
}

/// A consistent snapshot of orchestrator state, pushed to subscribers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Active mode.
    pub mode: Mode,
    /// Sub-state within the active mode; `None` when idle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_mode: Option<SubMode>,
    /// Full context at the time of the change.
    pub context: Context,
}

impl Mode {
    /// The mode's wire label (`idle`, `insightMode`, ...).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Insight => "insightMode",
            Self::Flow => "flowMode",
            Self::LiveTrace => "liveTraceMode",
            Self::Hotswap => "hotswapMode",
        }
    }
}

impl SubMode {
    /// The sub-state's wire label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Results => "results",
            Self::FetchingSuggestions => "fetchingSuggestions",
            Self::SuggestionsReceived => "suggestionsReceived",
            Self::ApplyingSuggestion => "applyingSuggestion",
            Self::Processing => "processing",
            Self::Tracing => "tracing",
            Self::Completed => "completed",
            Self::Swapping => "swapping",
            Self::Error => "error",
        }
    }
}

impl StateSnapshot {
    /// Dotted state value for display, e.g. `insightMode.analyzing` or
    /// `idle`.
    #[must_use]
    pub fn state_value(&self) -> String {
        match self.sub_mode {
            Some(sub) => format!("{}.{}", self.mode.label(), sub.label()),
            None => self.mode.label().to_string(),
        }
    }
}
