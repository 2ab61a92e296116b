//! The inbound command union.
//!
//! Every external request enters the orchestrator as one of these typed
//! variants. The enum is closed: unknown `type` tags fail deserialization at
//! the boundary instead of flowing through untyped. Wire names keep the
//! original dotted `start.<mode>` spelling.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::context::{HotswapHistoryEntry, ProviderConfig};
use crate::events::LiveEvent;
use crate::results::AiSuggestion;

/// A typed inbound command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Enter insight mode (starts instrumentation).
    #[serde(rename = "start.insightMode")]
    StartInsight,
    /// Enter flow mode.
    #[serde(rename = "start.flowMode")]
    StartFlow,
    /// Enter live-trace mode (starts instrumentation).
    #[serde(rename = "start.liveTraceMode")]
    StartLiveTrace,
    /// Enter hotswap mode.
    #[serde(rename = "start.hotswapMode")]
    StartHotswap,
    /// Leave the active mode, cancel its in-flight work, and return to idle.
    #[serde(rename = "exit")]
    Exit,

    /// Analyze the current file (insight mode).
    #[serde(rename = "analyze")]
    Analyze,
    /// Fetch AI suggestions for an error message (insight mode).
    #[serde(rename = "fetchSuggestions", rename_all = "camelCase")]
    FetchSuggestions {
        /// Error to get suggestions for.
        error_message: String,
    },
    /// Apply one fetched suggestion to the current file (insight mode).
    #[serde(rename = "applySuggestion")]
    ApplySuggestion {
        /// The chosen suggestion.
        suggestion: AiSuggestion,
    },

    /// Generate the execution flow for a function (flow mode).
    #[serde(rename = "process", rename_all = "camelCase")]
    Process {
        /// Function to visualize. Falls back to the context's
        /// `selected_function` when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        function_name: Option<String>,
    },

    /// Start a live trace session (live-trace mode).
    #[serde(rename = "trace")]
    Trace,

    /// Hotswap using the context's `state_id` and `new_code` (hotswap mode).
    #[serde(rename = "swap")]
    Swap,
    /// Roll back to a recorded state (hotswap mode).
    #[serde(rename = "rollback", rename_all = "camelCase")]
    Rollback {
        /// State to roll back to.
        state_id: String,
    },
    /// Apply a fix against a recorded state (hotswap mode).
    #[serde(rename = "applyFix", rename_all = "camelCase")]
    ApplyFix {
        /// State to apply the fix to.
        state_id: String,
        /// Replacement code.
        new_code: String,
    },
    /// Resume execution from a recorded state (hotswap mode).
    #[serde(rename = "playForward", rename_all = "camelCase")]
    PlayForward {
        /// State to resume from.
        state_id: String,
    },
    /// Pre-populate the target a subsequent `swap` acts on. Accepted in any
    /// state.
    #[serde(rename = "setHotswapTarget", rename_all = "camelCase")]
    SetHotswapTarget {
        /// State the next swap acts on.
        state_id: String,
        /// Replacement code for the next swap.
        new_code: String,
    },

    /// Set the user's current file. Accepted in any state.
    #[serde(rename = "updateCurrentFile")]
    UpdateCurrentFile {
        /// New current file.
        file: PathBuf,
    },
    /// Set the selected function. Accepted in any state.
    #[serde(rename = "updateSelectedFunction", rename_all = "camelCase")]
    UpdateSelectedFunction {
        /// New selected function.
        function_name: String,
    },
    /// Replace the AI provider configuration. Accepted in any state; mode
    /// logic never mutates it.
    #[serde(rename = "updateProviderConfig")]
    UpdateProviderConfig {
        /// New provider configuration.
        config: ProviderConfig,
    },
    /// Append a live event. Sourced from the event ingestor while tracing.
    #[serde(rename = "addLiveEvent")]
    AddLiveEvent {
        /// The normalized event.
        event: LiveEvent,
    },
    /// Reset the live event log to empty. Accepted in any state.
    #[serde(rename = "clearLiveEvents")]
    ClearLiveEvents,
    /// Append a hotswap history entry directly. Accepted in any state.
    #[serde(rename = "addHotswapHistoryEntry")]
    AddHotswapHistoryEntry {
        /// The audit entry.
        entry: HotswapHistoryEntry,
    },
    /// Reset the hotswap history to empty. Accepted in any state.
    #[serde(rename = "clearHotswapHistory")]
    ClearHotswapHistory,
}
