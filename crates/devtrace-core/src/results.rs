//! Per-mode result records and AI suggestions.
//!
//! Each operating mode stores at most one of these in the [`Context`]
//! (`analysis_results`, `flow_results`, `trace_results`, `hotswap_results`).
//! All shapes match the backend wire contract for direct deserialization.
//!
//! [`Context`]: crate::context::Context

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────────────────────────────────────

/// Severity of an analysis issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed — runtime failures, data loss.
    Critical,
    /// Should be fixed — likely bugs.
    Warning,
    /// Informational findings.
    Info,
}

/// One issue found by code analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Issue identifier, unique within one analysis run.
    pub id: u64,
    /// Issue severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// File the issue was found in.
    pub file_path: String,
    /// 1-based line number.
    pub line_number: u32,
}

/// Output of one analysis operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Issues found, in backend order.
    pub issues: Vec<Issue>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Flow
// ─────────────────────────────────────────────────────────────────────────────

/// One call node in an execution-flow graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    /// Node identifier, unique within the graph.
    pub node_id: String,
    /// Function executed at this node.
    pub function_name: String,
    /// Rendered arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Rendered return value, if the call returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,
    /// Wall time spent in this call, in milliseconds.
    pub time_ms: u64,
    /// Calling node, `None` for the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
    /// Log lines captured during this call.
    #[serde(default)]
    pub associated_logs: Vec<String>,
}

/// A directed edge between two flow nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    /// Source node.
    pub from_node_id: String,
    /// Target node.
    pub to_node_id: String,
    /// Edge label (e.g. `calls`).
    pub label: String,
}

/// Output of one flow-generation operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    /// Call nodes.
    pub nodes: Vec<FlowNode>,
    /// Call edges.
    pub edges: Vec<FlowEdge>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Trace / Hotswap
// ─────────────────────────────────────────────────────────────────────────────

/// Summary recorded when a live trace session ends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResult {
    /// Trace session identifier.
    pub session_id: String,
    /// Number of events the session captured.
    pub events_captured: u64,
    /// Optional human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Output of one hotswap operation (swap, rollback, apply-fix, play-forward).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotswapResult {
    /// Outcome status reported by the runtime (e.g. `success`).
    pub status: String,
    /// Human-readable detail, recorded into the hotswap history.
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// AI suggestions
// ─────────────────────────────────────────────────────────────────────────────

/// What kind of change a suggestion proposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    /// Fixes a defect.
    #[default]
    Fix,
    /// Restructures without changing behavior.
    Refactor,
    /// Improves performance.
    Optimization,
}

/// Expected blast radius of applying a suggestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionImpact {
    /// Localized change.
    Low,
    /// Touches several call sites.
    #[default]
    Medium,
    /// Cross-cutting change.
    High,
}

/// One AI-generated code suggestion. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSuggestion {
    /// Identifier, unique within one fetch batch. Keyed for idempotent
    /// lookup and apply.
    pub id: String,
    /// What the suggestion does.
    pub description: String,
    /// Proposed replacement code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    /// Model confidence in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Change category.
    #[serde(default)]
    pub category: SuggestionCategory,
    /// Expected impact.
    #[serde(default)]
    pub impact: SuggestionImpact,
}
