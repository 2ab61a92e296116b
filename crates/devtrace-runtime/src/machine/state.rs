//! Tagged-union machine states.
//!
//! One top-level [`ModeState`] with a nested sub-state enum per composite
//! mode. The topology itself enforces the core invariants: there is no
//! mode-to-mode edge (a mode must exit to idle first), and only the
//! in-flight sub-states (`Analyzing`, `FetchingSuggestions`,
//! `ApplyingSuggestion`, `Processing`, `Tracing`, `Swapping`) ever carry a
//! dispatched operation.

use devtrace_core::snapshot::{Mode, SubMode};

/// Insight mode sub-states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsightState {
    /// Mode entered, nothing dispatched.
    Idle,
    /// Analysis operation in flight.
    Analyzing,
    /// Analysis results available.
    Results,
    /// Suggestion fetch in flight.
    FetchingSuggestions,
    /// Suggestions available.
    SuggestionsReceived,
    /// Suggestion apply in flight.
    ApplyingSuggestion,
    /// Last operation failed. Stable until retry or exit.
    Error,
}

/// Flow mode sub-states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// Mode entered, nothing dispatched.
    Idle,
    /// Flow generation in flight.
    Processing,
    /// Flow results available.
    Completed,
    /// Flow generation failed.
    Error,
}

/// Live-trace mode sub-states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveTraceState {
    /// Mode entered, nothing dispatched.
    Idle,
    /// Trace session running; live events are being ingested.
    Tracing,
    /// Trace session finished.
    Completed,
    /// Trace session failed. Collected events are kept.
    Error,
}

/// Hotswap mode sub-states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotswapState {
    /// Mode entered, nothing dispatched.
    Idle,
    /// Hotswap operation in flight.
    Swapping,
    /// Hotswap applied and recorded.
    Completed,
    /// Hotswap failed; nothing was recorded.
    Error,
}

/// Top-level machine state. Exactly one variant is active at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModeState {
    /// Waiting for a mode to start.
    #[default]
    Idle,
    /// Insight (analysis + suggestions) mode.
    Insight(InsightState),
    /// Flow visualization mode.
    Flow(FlowState),
    /// Live tracing mode.
    LiveTrace(LiveTraceState),
    /// Hotswap mode.
    Hotswap(HotswapState),
}

impl ModeState {
    /// The top-level mode this state belongs to.
    #[must_use]
    pub fn mode(self) -> Mode {
        match self {
            Self::Idle => Mode::Idle,
            Self::Insight(_) => Mode::Insight,
            Self::Flow(_) => Mode::Flow,
            Self::LiveTrace(_) => Mode::LiveTrace,
            Self::Hotswap(_) => Mode::Hotswap,
        }
    }

    /// The active sub-state, `None` at top-level idle.
    #[must_use]
    pub fn sub_mode(self) -> Option<SubMode> {
        match self {
            Self::Idle => None,
            Self::Insight(s) => Some(match s {
                InsightState::Idle => SubMode::Idle,
                InsightState::Analyzing => SubMode::Analyzing,
                InsightState::Results => SubMode::Results,
                InsightState::FetchingSuggestions => SubMode::FetchingSuggestions,
                InsightState::SuggestionsReceived => SubMode::SuggestionsReceived,
                InsightState::ApplyingSuggestion => SubMode::ApplyingSuggestion,
                InsightState::Error => SubMode::Error,
            }),
            Self::Flow(s) => Some(match s {
                FlowState::Idle => SubMode::Idle,
                FlowState::Processing => SubMode::Processing,
                FlowState::Completed => SubMode::Completed,
                FlowState::Error => SubMode::Error,
            }),
            Self::LiveTrace(s) => Some(match s {
                LiveTraceState::Idle => SubMode::Idle,
                LiveTraceState::Tracing => SubMode::Tracing,
                LiveTraceState::Completed => SubMode::Completed,
                LiveTraceState::Error => SubMode::Error,
            }),
            Self::Hotswap(s) => Some(match s {
                HotswapState::Idle => SubMode::Idle,
                HotswapState::Swapping => SubMode::Swapping,
                HotswapState::Completed => SubMode::Completed,
                HotswapState::Error => SubMode::Error,
            }),
        }
    }

    /// Dotted display label (`insightMode.analyzing`, `idle`, ...).
    #[must_use]
    pub fn label(self) -> String {
        match self.sub_mode() {
            Some(sub) => format!("{}.{}", self.mode().label(), sub.label()),
            None => self.mode().label().to_string(),
        }
    }
}
