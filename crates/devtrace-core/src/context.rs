//! The context aggregate — the single record of accumulated state.
//!
//! [`Context`] is owned exclusively by the orchestrator. External components
//! only ever see cloned snapshots; all mutation happens inside the
//! orchestrator's single-threaded transition function. `live_events` and
//! `hotswap_history` grow by append (or are reset to empty by explicit clear
//! commands) — existing elements are never edited in place.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::LiveEvent;
use crate::results::{AiSuggestion, AnalysisResult, FlowResult, HotswapResult, TraceResult};

/// Supported AI providers for suggestion fetching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// OpenAI completion API.
    #[default]
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// Google AI API.
    Google,
    /// GitHub Copilot.
    #[serde(rename = "github")]
    GithubCopilot,
}

/// AI provider configuration. Mutated only by explicit configuration
/// commands, never by mode logic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Which provider to fetch suggestions from.
    pub provider: AiProvider,
    /// Credential passed through to the provider.
    pub api_key: String,
}

/// One audit record of an applied hotswap. Append-only; ordering is append
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotswapHistoryEntry {
    /// When the hotswap was applied.
    pub timestamp: DateTime<Utc>,
    /// What was applied, derived from the operation result.
    pub details: String,
}

/// Accumulated application state, replaced (not mutated in place, as
/// observed by subscribers) on every transition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// File the user is focused on. Set by `updateCurrentFile`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<PathBuf>,
    /// Function selected for flow analysis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_function: Option<String>,
    /// Hotswap target state, pre-populated before a swap is dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    /// Replacement code for the next swap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_code: Option<String>,
    /// Last successful analysis output. Cleared on insight-mode exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_results: Option<AnalysisResult>,
    /// Last successful flow output. Cleared on flow-mode exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_results: Option<FlowResult>,
    /// Last trace session summary. Cleared on live-trace-mode exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_results: Option<TraceResult>,
    /// Last successful hotswap output. Cleared on hotswap-mode exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotswap_results: Option<HotswapResult>,
    /// Live events collected while tracing. Append-only; cleared only by
    /// `clearLiveEvents`. Unbounded growth is an accepted risk.
    pub live_events: Vec<LiveEvent>,
    /// Audit log of applied hotswaps. Failed attempts are never recorded.
    pub hotswap_history: Vec<HotswapHistoryEntry>,
    /// Last fetched AI suggestions, keyed by suggestion id. Replaced
    /// wholesale on each successful fetch.
    pub suggestions: BTreeMap<String, AiSuggestion>,
    /// Message from the most recent failure. Cleared by the next successful
    /// transition or by mode exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// AI provider configuration.
    pub provider_config: ProviderConfig,
}

impl Context {
    /// Replace the suggestion map with a freshly fetched batch.
    pub fn replace_suggestions(&mut self, batch: Vec<AiSuggestion>) {
        self.suggestions = batch.into_iter().map(|s| (s.id.clone(), s)).collect();
    }

    /// Append an applied-hotswap audit record.
    pub fn record_hotswap(&mut self, details: impl Into<String>) {
        self.hotswap_history.push(HotswapHistoryEntry {
            timestamp: Utc::now(),
            details: details.into(),
        });
    }
}
