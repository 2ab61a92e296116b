//! Request and response payloads for the runtime backend API.
//!
//! Everything on the wire is camelCase JSON. Result payloads reuse the
//! shared types from `devtrace-core`; this module only adds the envelopes
//! specific to the HTTP surface.

use serde::{Deserialize, Serialize};

use devtrace_core::context::AiProvider;
use devtrace_core::results::AiSuggestion;

/// `POST /analyze` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// File to analyze.
    pub file_path: String,
}

/// `POST /flow` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRequest {
    /// Function whose call graph to generate.
    pub function_name: String,
}

/// `POST /trace/start` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStarted {
    /// Identity of the started session.
    pub session_id: String,
}

/// Request naming an existing trace session (`/trace/result`, `/trace/stop`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSessionRequest {
    /// Session to act on.
    pub session_id: String,
}

/// The hotswap verbs the backend understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HotswapAction {
    /// Replace code for a recorded state.
    #[serde(rename = "swap")]
    Swap,
    /// Restore a recorded state.
    #[serde(rename = "rollback")]
    Rollback,
    /// Apply a fix against a recorded state.
    #[serde(rename = "applyFix")]
    ApplyFix,
    /// Resume from a recorded state.
    #[serde(rename = "playForward")]
    PlayForward,
}

/// `POST /hotswap` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotswapRequest {
    /// Which verb to perform.
    pub action: HotswapAction,
    /// Target recorded state.
    pub state_id: String,
    /// Replacement code, for `swap` and `applyFix`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_code: Option<String>,
}

/// `POST /ai/suggestFix` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestFixRequest {
    /// The error to get suggestions for.
    pub error_message: String,
    /// File the error occurred in.
    pub file_path: String,
    /// Which AI provider to route to.
    pub provider: AiProvider,
    /// Provider credential, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// `POST /ai/suggestFix` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsResponse {
    /// Fetched suggestion batch.
    #[serde(default)]
    pub suggestions: Vec<AiSuggestion>,
}

/// `POST /code/applySuggestion` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplySuggestionRequest {
    /// File to edit.
    pub file_path: String,
    /// The chosen suggestion.
    pub suggestion: AiSuggestion,
}

/// `POST /code/applySuggestion` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedResponse {
    /// Whether the edit was made.
    #[serde(default)]
    pub applied: bool,
}

/// Error body the backend returns on non-success statuses. Both fields are
/// optional; some routes use `error`, others `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Error description under the `error` key.
    pub error: Option<String>,
    /// Error description under the `message` key.
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Best-effort error message, falling back to `fallback`.
    #[must_use]
    pub fn into_message(self, fallback: &str) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| fallback.to_string())
    }
}
