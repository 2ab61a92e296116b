//! Live trace events and their wire-level raw form.
//!
//! The backend pushes partial, loosely-shaped events over the live stream.
//! [`RawLiveEvent`] captures that wire shape; [`LiveEvent::from_raw`]
//! normalizes it, assigning defaults for every missing optional field, before
//! the event is appended to the context. A [`LiveEvent`] is immutable once
//! appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::results::AiSuggestion;

/// Classification of a live trace event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveEventKind {
    /// Runtime error.
    Error,
    /// Suspicious but non-fatal condition.
    Warning,
    /// Informational event.
    Info,
    /// Plain log line.
    #[default]
    Log,
    /// Performance measurement.
    Performance,
}

/// Source position an event refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// File path as reported by the runtime.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

/// One normalized record from the live trace stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    /// Unique event identifier.
    pub event_id: String,
    /// Event classification.
    pub kind: LiveEventKind,
    /// Event message.
    pub message: String,
    /// Source position, when the runtime reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// AI-suggested fix attached by the backend, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<AiSuggestion>,
}

impl LiveEvent {
    /// Normalize a raw wire event, assigning defaults for missing fields:
    /// a generated event id, kind [`LiveEventKind::Log`], an empty message,
    /// and the current time.
    #[must_use]
    pub fn from_raw(raw: RawLiveEvent) -> Self {
        let source = match (raw.file_path, raw.line_number) {
            (Some(file), Some(line)) => Some(SourceLocation { file, line }),
            _ => None,
        };
        Self {
            event_id: raw
                .event_id
                .unwrap_or_else(|| format!("evt_{}", uuid::Uuid::now_v7())),
            kind: raw.kind.unwrap_or_default(),
            message: raw.message.unwrap_or_default(),
            source,
            timestamp: raw.timestamp.unwrap_or_else(Utc::now),
            suggested_fix: raw.suggested_fix.map(AiSuggestion::from),
        }
    }
}

/// A suggested fix as it appears on the wire: description and snippet only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSuggestedFix {
    /// What the fix does.
    #[serde(default)]
    pub description: String,
    /// Proposed code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl From<RawSuggestedFix> for AiSuggestion {
    fn from(raw: RawSuggestedFix) -> Self {
        Self {
            id: format!("fix_{}", uuid::Uuid::now_v7()),
            description: raw.description,
            code_snippet: raw.code_snippet,
            confidence: None,
            category: crate::results::SuggestionCategory::Fix,
            impact: crate::results::SuggestionImpact::Medium,
        }
    }
}

/// A live event as received from the stream — every field optional.
///
/// The backend historically used `type` for the kind and flat
/// `filePath`/`lineNumber` fields; both are accepted here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLiveEvent {
    /// Event identifier, if the runtime assigned one.
    #[serde(default)]
    pub event_id: Option<String>,
    /// Event classification.
    #[serde(default, alias = "type")]
    pub kind: Option<LiveEventKind>,
    /// Event message.
    #[serde(default)]
    pub message: Option<String>,
    /// Source file.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Source line.
    #[serde(default)]
    pub line_number: Option<u32>,
    /// Event time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Attached suggested fix.
    #[serde(default)]
    pub suggested_fix: Option<RawSuggestedFix>,
}
