//! The mode-orchestration state machine.
//!
//! [`Machine`] is the synchronous core: it owns the [`Context`] and the
//! [`ModeState`], and [`Machine::apply`] is the single transition function
//! `(state, context, input) -> (state', context', effects)`. It performs no
//! I/O — dispatching operations, opening the live stream, and notifying
//! observers are all returned as [`Effect`]s for the runner to execute.
//!
//! Invariants enforced here:
//!
//! - Exactly one top-level mode is active at any time; a mode must exit to
//!   idle before another starts.
//! - At most one operation is outstanding; a completion is applied only if
//!   its [`OpId`] matches, so late results of cancelled work are discarded.
//! - `error_message` is set only by a failed operation or precondition and
//!   cleared by the next successful transition or by exit.
//! - A failed hotswap never appends to the history; a successful one
//!   appends exactly one entry.

pub mod ops;
pub mod state;

use tracing::{debug, warn};

use devtrace_core::command::Command;
use devtrace_core::context::Context;
use devtrace_core::results::AiSuggestion;
use devtrace_core::snapshot::StateSnapshot;

use crate::errors::RuntimeError;

pub use ops::{Effect, Input, OpId, OperationKind, OperationOutput, OperationRequest, Step};
pub use state::{FlowState, HotswapState, InsightState, LiveTraceState, ModeState};

use self::ops::OperationOutput as Out;

/// The hierarchical mode state machine. Pure: no I/O, no async.
#[derive(Debug, Default)]
pub struct Machine {
    state: ModeState,
    context: Context,
    pending: Option<OpId>,
    next_op: u64,
}

impl Machine {
    /// Create a machine in the idle state with an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a machine with a pre-populated context (e.g. provider
    /// configuration).
    #[must_use]
    pub fn with_context(context: Context) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ModeState {
        self.state
    }

    /// Current context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Whether an operation is outstanding.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Observer-facing snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            mode: self.state.mode(),
            sub_mode: self.state.sub_mode(),
            context: self.context.clone(),
        }
    }

    /// Apply one input and return the effects to execute.
    pub fn apply(&mut self, input: Input) -> Step {
        match input {
            Input::Command(cmd) => self.apply_command(cmd),
            Input::Completion { op, outcome } => self.apply_completion(op, outcome),
            Input::StreamFailed { message } => self.apply_stream_failure(message),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────

    fn apply_command(&mut self, cmd: Command) -> Step {
        match cmd {
            Command::StartInsight => self.start_mode(
                ModeState::Insight(InsightState::Idle),
                vec![Effect::StartInstrumentation],
            ),
            Command::StartFlow => self.start_mode(ModeState::Flow(FlowState::Idle), Vec::new()),
            Command::StartLiveTrace => self.start_mode(
                ModeState::LiveTrace(LiveTraceState::Idle),
                vec![Effect::StartInstrumentation],
            ),
            Command::StartHotswap => {
                self.start_mode(ModeState::Hotswap(HotswapState::Idle), Vec::new())
            }
            Command::Exit => self.exit_mode(),

            Command::Analyze => self.on_analyze(),
            Command::FetchSuggestions { error_message } => self.on_fetch_suggestions(error_message),
            Command::ApplySuggestion { suggestion } => self.on_apply_suggestion(suggestion),
            Command::Process { function_name } => self.on_process(function_name),
            Command::Trace => self.on_trace(),
            Command::Swap => self.on_swap(),
            Command::Rollback { state_id } => {
                self.on_hotswap_op(state_id, None, HotswapVerb::Rollback)
            }
            Command::ApplyFix { state_id, new_code } => {
                self.on_hotswap_op(state_id, Some(new_code), HotswapVerb::ApplyFix)
            }
            Command::PlayForward { state_id } => {
                self.on_hotswap_op(state_id, None, HotswapVerb::PlayForward)
            }

            Command::UpdateCurrentFile { file } => {
                self.context.current_file = Some(file);
                Step::changed()
            }
            Command::UpdateSelectedFunction { function_name } => {
                self.context.selected_function = Some(function_name);
                Step::changed()
            }
            Command::UpdateProviderConfig { config } => {
                self.context.provider_config = config;
                Step::changed()
            }
            Command::SetHotswapTarget { state_id, new_code } => {
                self.context.state_id = Some(state_id);
                self.context.new_code = Some(new_code);
                Step::changed()
            }
            Command::AddLiveEvent { event } => {
                if self.state == ModeState::LiveTrace(LiveTraceState::Tracing) {
                    self.context.live_events.push(event);
                    Step::changed()
                } else {
                    debug!(state = %self.state.label(), "dropping live event outside tracing");
                    Step::unchanged()
                }
            }
            Command::ClearLiveEvents => {
                self.context.live_events.clear();
                Step::changed()
            }
            Command::AddHotswapHistoryEntry { entry } => {
                self.context.hotswap_history.push(entry);
                Step::changed()
            }
            Command::ClearHotswapHistory => {
                self.context.hotswap_history.clear();
                Step::changed()
            }
        }
    }

    fn start_mode(&mut self, target: ModeState, effects: Vec<Effect>) -> Step {
        if self.state != ModeState::Idle {
            warn!(
                active = %self.state.label(),
                requested = %target.label(),
                "mode start rejected; exit the active mode first"
            );
            return Step::unchanged();
        }
        debug!(mode = %target.label(), "entering mode");
        self.state = target;
        Step::with_effects(effects)
    }

    fn exit_mode(&mut self) -> Step {
        let mut effects = Vec::new();
        if self.pending.take().is_some() {
            effects.push(Effect::CancelOperation);
        }
        match self.state {
            ModeState::Idle => {
                debug!("exit ignored; already idle");
                return Step::unchanged();
            }
            ModeState::Insight(_) => {
                self.context.analysis_results = None;
                effects.push(Effect::StopInstrumentation);
            }
            ModeState::Flow(_) => self.context.flow_results = None,
            ModeState::LiveTrace(_) => {
                self.context.trace_results = None;
                effects.push(Effect::CloseEventStream);
                effects.push(Effect::StopInstrumentation);
            }
            ModeState::Hotswap(_) => self.context.hotswap_results = None,
        }
        debug!(mode = %self.state.label(), "exiting to idle");
        self.context.error_message = None;
        self.state = ModeState::Idle;
        Step::with_effects(effects)
    }

    fn on_analyze(&mut self) -> Step {
        match self.state {
            ModeState::Insight(InsightState::Idle | InsightState::Results) => {}
            _ => return rejected("analyze", self.state),
        }
        let Some(file) = self.context.current_file.clone() else {
            return self.precondition_failure(
                ModeState::Insight(InsightState::Error),
                "analyze requires a current file; send updateCurrentFile first",
            );
        };
        self.state = ModeState::Insight(InsightState::Analyzing);
        self.dispatch(OperationKind::Analyze { file })
    }

    fn on_fetch_suggestions(&mut self, error_message: String) -> Step {
        if self.state != ModeState::Insight(InsightState::Results) {
            return rejected("fetchSuggestions", self.state);
        }
        let Some(file) = self.context.current_file.clone() else {
            return self.precondition_failure(
                ModeState::Insight(InsightState::Error),
                "fetchSuggestions requires a current file",
            );
        };
        let config = self.context.provider_config.clone();
        self.state = ModeState::Insight(InsightState::FetchingSuggestions);
        self.dispatch(OperationKind::FetchSuggestions {
            error_message,
            file,
            config,
        })
    }

    fn on_apply_suggestion(&mut self, suggestion: AiSuggestion) -> Step {
        if self.state != ModeState::Insight(InsightState::SuggestionsReceived) {
            return rejected("applySuggestion", self.state);
        }
        let Some(file) = self.context.current_file.clone() else {
            return self.precondition_failure(
                ModeState::Insight(InsightState::Error),
                "applySuggestion requires a current file",
            );
        };
        self.state = ModeState::Insight(InsightState::ApplyingSuggestion);
        self.dispatch(OperationKind::ApplySuggestion { file, suggestion })
    }

    fn on_process(&mut self, function_name: Option<String>) -> Step {
        if self.state != ModeState::Flow(FlowState::Idle) {
            return rejected("process", self.state);
        }
        if let Some(name) = function_name {
            self.context.selected_function = Some(name);
        }
        let Some(function_name) = self.context.selected_function.clone() else {
            return self.precondition_failure(
                ModeState::Flow(FlowState::Error),
                "process requires a selected function",
            );
        };
        self.state = ModeState::Flow(FlowState::Processing);
        self.dispatch(OperationKind::GenerateFlow { function_name })
    }

    fn on_trace(&mut self) -> Step {
        if self.state != ModeState::LiveTrace(LiveTraceState::Idle) {
            return rejected("trace", self.state);
        }
        self.state = ModeState::LiveTrace(LiveTraceState::Tracing);
        // Two independent concurrent activities: the long-lived session
        // operation and the event subscription.
        let mut step = self.dispatch(OperationKind::StartTrace);
        step.effects.push(Effect::OpenEventStream);
        step
    }

    fn on_swap(&mut self) -> Step {
        match self.state {
            ModeState::Hotswap(HotswapState::Idle | HotswapState::Completed) => {}
            _ => return rejected("swap", self.state),
        }
        let (Some(state_id), Some(new_code)) =
            (self.context.state_id.clone(), self.context.new_code.clone())
        else {
            return self.precondition_failure(
                ModeState::Hotswap(HotswapState::Error),
                "swap requires stateId and newCode in the context",
            );
        };
        self.state = ModeState::Hotswap(HotswapState::Swapping);
        self.dispatch(OperationKind::PerformHotswap { state_id, new_code })
    }

    fn on_hotswap_op(
        &mut self,
        state_id: String,
        new_code: Option<String>,
        verb: HotswapVerb,
    ) -> Step {
        match self.state {
            ModeState::Hotswap(HotswapState::Idle | HotswapState::Completed) => {}
            _ => return rejected(verb.name(), self.state),
        }
        self.context.state_id = Some(state_id.clone());
        let kind = match verb {
            HotswapVerb::Rollback => OperationKind::Rollback { state_id },
            HotswapVerb::PlayForward => OperationKind::PlayForward { state_id },
            HotswapVerb::ApplyFix => {
                // new_code is always present for applyFix.
                let new_code = new_code.unwrap_or_default();
                self.context.new_code = Some(new_code.clone());
                OperationKind::ApplyFix { state_id, new_code }
            }
        };
        self.state = ModeState::Hotswap(HotswapState::Swapping);
        self.dispatch(kind)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Completions
    // ─────────────────────────────────────────────────────────────────────

    fn apply_completion(&mut self, op: OpId, outcome: Result<OperationOutput, String>) -> Step {
        if self.pending != Some(op) {
            debug!(%op, "discarding stale completion");
            return Step::unchanged();
        }
        self.pending = None;

        match self.state {
            ModeState::Insight(InsightState::Analyzing) => match outcome {
                Ok(Out::Analysis(results)) => {
                    self.context.analysis_results = Some(results);
                    self.succeed(ModeState::Insight(InsightState::Results))
                }
                other => self.operation_failed(ModeState::Insight(InsightState::Error), other),
            },
            ModeState::Insight(InsightState::FetchingSuggestions) => match outcome {
                Ok(Out::Suggestions(batch)) => {
                    self.context.replace_suggestions(batch);
                    self.succeed(ModeState::Insight(InsightState::SuggestionsReceived))
                }
                other => self.operation_failed(ModeState::Insight(InsightState::Error), other),
            },
            ModeState::Insight(InsightState::ApplyingSuggestion) => match outcome {
                Ok(Out::SuggestionApplied(true)) => {
                    self.succeed(ModeState::Insight(InsightState::Results))
                }
                Ok(Out::SuggestionApplied(false)) => self.operation_failed(
                    ModeState::Insight(InsightState::Error),
                    Err("the runtime declined to apply the suggestion".to_string()),
                ),
                other => self.operation_failed(ModeState::Insight(InsightState::Error), other),
            },
            ModeState::Flow(FlowState::Processing) => match outcome {
                Ok(Out::Flow(results)) => {
                    self.context.flow_results = Some(results);
                    self.succeed(ModeState::Flow(FlowState::Completed))
                }
                other => self.operation_failed(ModeState::Flow(FlowState::Error), other),
            },
            ModeState::LiveTrace(LiveTraceState::Tracing) => {
                // Either way the tracing sub-state is over, so the
                // subscription is released. Collected events are kept.
                let mut step = match outcome {
                    Ok(Out::Trace(results)) => {
                        self.context.trace_results = Some(results);
                        self.succeed(ModeState::LiveTrace(LiveTraceState::Completed))
                    }
                    other => {
                        self.operation_failed(ModeState::LiveTrace(LiveTraceState::Error), other)
                    }
                };
                step.effects.push(Effect::CloseEventStream);
                step
            }
            ModeState::Hotswap(HotswapState::Swapping) => match outcome {
                Ok(Out::Hotswap(results)) => {
                    self.context.record_hotswap(results.message.clone());
                    self.context.hotswap_results = Some(results);
                    self.succeed(ModeState::Hotswap(HotswapState::Completed))
                }
                // Failed attempts are transient error state, never history.
                other => self.operation_failed(ModeState::Hotswap(HotswapState::Error), other),
            },
            state => {
                warn!(state = %state.label(), %op, "completion arrived in a non-dispatching state");
                Step::unchanged()
            }
        }
    }

    fn apply_stream_failure(&mut self, message: String) -> Step {
        if let ModeState::LiveTrace(_) = self.state {
            warn!(error = %message, "live event stream failed");
            self.context.error_message = Some(RuntimeError::Stream(message).to_string());
            Step::changed()
        } else {
            debug!(error = %message, "stream failure outside live trace ignored");
            Step::unchanged()
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn dispatch(&mut self, kind: OperationKind) -> Step {
        self.next_op += 1;
        let op = OpId(self.next_op);
        self.pending = Some(op);
        debug!(%op, ?kind, "dispatching operation");
        Step::with_effects(vec![Effect::Dispatch(OperationRequest { op, kind })])
    }

    fn succeed(&mut self, target: ModeState) -> Step {
        self.context.error_message = None;
        self.state = target;
        Step::changed()
    }

    fn operation_failed(
        &mut self,
        target: ModeState,
        outcome: Result<OperationOutput, String>,
    ) -> Step {
        let message = match outcome {
            Err(message) => message,
            Ok(output) => {
                warn!(?output, "operation resolved with a mismatched result kind");
                "operation returned an unexpected result kind".to_string()
            }
        };
        debug!(state = %target.label(), error = %message, "operation failed");
        self.context.error_message = Some(RuntimeError::Operation(message).to_string());
        self.state = target;
        Step::changed()
    }

    fn precondition_failure(&mut self, target: ModeState, message: &str) -> Step {
        warn!(state = %self.state.label(), %message, "precondition failed");
        self.context.error_message =
            Some(RuntimeError::Precondition(message.to_string()).to_string());
        self.state = target;
        Step::changed()
    }
}

/// Which hotswap endpoint a command maps to.
#[derive(Clone, Copy, Debug)]
enum HotswapVerb {
    Rollback,
    ApplyFix,
    PlayForward,
}

impl HotswapVerb {
    fn name(self) -> &'static str {
        match self {
            Self::Rollback => "rollback",
            Self::ApplyFix => "applyFix",
            Self::PlayForward => "playForward",
        }
    }
}

fn rejected(command: &str, state: ModeState) -> Step {
    warn!(command, state = %state.label(), "command not accepted in this state");
    Step::unchanged()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::path::PathBuf;

    use devtrace_core::events::{LiveEvent, RawLiveEvent};
    use devtrace_core::results::{
        AiSuggestion, AnalysisResult, FlowResult, HotswapResult, Issue, Severity,
        SuggestionCategory, SuggestionImpact, TraceResult,
    };

    fn issue() -> Issue {
        Issue {
            id: 1,
            severity: Severity::Critical,
            message: "Null reference at line 42".into(),
            file_path: "src/userController.js".into(),
            line_number: 42,
        }
    }

    fn suggestion(id: &str) -> AiSuggestion {
        AiSuggestion {
            id: id.into(),
            description: "Check for null".into(),
            code_snippet: Some("if user.is_none() { return; }".into()),
            confidence: Some(0.8),
            category: SuggestionCategory::Fix,
            impact: SuggestionImpact::Low,
        }
    }

    fn live_event(message: &str) -> LiveEvent {
        LiveEvent::from_raw(RawLiveEvent {
            message: Some(message.into()),
            ..RawLiveEvent::default()
        })
    }

    fn send(machine: &mut Machine, cmd: Command) -> Step {
        machine.apply(Input::Command(cmd))
    }

    /// Extract the single dispatched op id from a step.
    fn dispatched(step: &Step) -> OpId {
        for effect in &step.effects {
            if let Effect::Dispatch(req) = effect {
                return req.op;
            }
        }
        panic!("step dispatched nothing: {step:?}");
    }

    fn machine_with_file() -> Machine {
        let mut machine = Machine::new();
        let _ = send(
            &mut machine,
            Command::UpdateCurrentFile {
                file: PathBuf::from("src/userController.js"),
            },
        );
        machine
    }

    /// Drive insight mode to `results` with one issue.
    fn insight_at_results(machine: &mut Machine) -> OpId {
        let _ = send(machine, Command::StartInsight);
        let step = send(machine, Command::Analyze);
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Analysis(AnalysisResult {
                issues: vec![issue()],
            })),
        });
        op
    }

    // ── Mode exclusivity ────────────────────────────────────────────────

    #[test]
    fn starts_idle() {
        let machine = Machine::new();
        assert_eq!(machine.state(), ModeState::Idle);
        assert!(!machine.has_pending());
    }

    #[test]
    fn start_enters_mode_sub_idle() {
        let mut machine = Machine::new();
        let step = send(&mut machine, Command::StartFlow);
        assert!(step.changed);
        assert_eq!(machine.state(), ModeState::Flow(FlowState::Idle));
    }

    #[test]
    fn no_mode_to_mode_transition() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartInsight);
        let step = send(&mut machine, Command::StartFlow);
        assert!(!step.changed);
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Idle));
    }

    #[test]
    fn insight_start_begins_instrumentation() {
        let mut machine = Machine::new();
        let step = send(&mut machine, Command::StartInsight);
        assert_eq!(step.effects, vec![Effect::StartInstrumentation]);
    }

    #[test]
    fn hotswap_start_has_no_instrumentation() {
        let mut machine = Machine::new();
        let step = send(&mut machine, Command::StartHotswap);
        assert!(step.effects.is_empty());
    }

    #[test]
    fn exit_when_idle_is_a_no_op() {
        let mut machine = Machine::new();
        let step = send(&mut machine, Command::Exit);
        assert!(!step.changed);
    }

    // ── Insight mode ────────────────────────────────────────────────────

    #[test]
    fn scenario_a_analyze_reaches_results() {
        let mut machine = machine_with_file();
        let _ = send(&mut machine, Command::StartInsight);
        let step = send(&mut machine, Command::Analyze);
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Analyzing));
        let op = dispatched(&step);

        let step = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Analysis(AnalysisResult {
                issues: vec![issue()],
            })),
        });
        assert!(step.changed);
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Results));
        assert_eq!(machine.context().analysis_results.as_ref().unwrap().issues.len(), 1);
        assert!(machine.context().error_message.is_none());
    }

    #[test]
    fn analyze_without_file_is_precondition_failure() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartInsight);
        let step = send(&mut machine, Command::Analyze);
        assert!(step.effects.is_empty());
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Error));
        assert!(
            machine
                .context()
                .error_message
                .as_ref()
                .unwrap()
                .contains("precondition")
        );
    }

    #[test]
    fn analyze_failure_reaches_error() {
        let mut machine = machine_with_file();
        let _ = send(&mut machine, Command::StartInsight);
        let step = send(&mut machine, Command::Analyze);
        let op = dispatched(&step);

        let _ = machine.apply(Input::Completion {
            op,
            outcome: Err("analysis backend unreachable".into()),
        });
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Error));
        assert!(
            machine
                .context()
                .error_message
                .as_ref()
                .unwrap()
                .contains("analysis backend unreachable")
        );
    }

    #[test]
    fn scenario_b_failed_fetch_keeps_suggestions_untouched() {
        let mut machine = machine_with_file();
        let _ = insight_at_results(&mut machine);

        let step = send(
            &mut machine,
            Command::FetchSuggestions {
                error_message: "Null reference".into(),
            },
        );
        assert_eq!(
            machine.state(),
            ModeState::Insight(InsightState::FetchingSuggestions)
        );
        let op = dispatched(&step);

        let _ = machine.apply(Input::Completion {
            op,
            outcome: Err("provider quota exceeded".into()),
        });
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Error));
        assert!(machine.context().error_message.is_some());
        assert!(machine.context().suggestions.is_empty());
    }

    #[test]
    fn fetch_success_replaces_suggestions() {
        let mut machine = machine_with_file();
        let _ = insight_at_results(&mut machine);

        let step = send(
            &mut machine,
            Command::FetchSuggestions {
                error_message: "Null reference".into(),
            },
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Suggestions(vec![suggestion("s1"), suggestion("s2")])),
        });
        assert_eq!(
            machine.state(),
            ModeState::Insight(InsightState::SuggestionsReceived)
        );
        assert_eq!(machine.context().suggestions.len(), 2);

        // A second fetch replaces, never merges.
        let step = send(
            &mut machine,
            Command::ApplySuggestion {
                suggestion: suggestion("s1"),
            },
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::SuggestionApplied(true)),
        });
        let step = send(
            &mut machine,
            Command::FetchSuggestions {
                error_message: "other".into(),
            },
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Suggestions(vec![suggestion("s3")])),
        });
        assert_eq!(machine.context().suggestions.len(), 1);
        assert!(machine.context().suggestions.contains_key("s3"));
    }

    #[test]
    fn apply_suggestion_success_returns_to_results_and_keeps_suggestions() {
        let mut machine = machine_with_file();
        let _ = insight_at_results(&mut machine);
        let step = send(
            &mut machine,
            Command::FetchSuggestions {
                error_message: "e".into(),
            },
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Suggestions(vec![suggestion("s1")])),
        });

        let step = send(
            &mut machine,
            Command::ApplySuggestion {
                suggestion: suggestion("s1"),
            },
        );
        assert_eq!(
            machine.state(),
            ModeState::Insight(InsightState::ApplyingSuggestion)
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::SuggestionApplied(true)),
        });
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Results));
        assert_eq!(machine.context().suggestions.len(), 1);
    }

    #[test]
    fn declined_suggestion_apply_is_a_failure() {
        let mut machine = machine_with_file();
        let _ = insight_at_results(&mut machine);
        let step = send(
            &mut machine,
            Command::FetchSuggestions {
                error_message: "e".into(),
            },
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Suggestions(vec![suggestion("s1")])),
        });
        let step = send(
            &mut machine,
            Command::ApplySuggestion {
                suggestion: suggestion("s1"),
            },
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::SuggestionApplied(false)),
        });
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Error));
        assert!(machine.context().error_message.is_some());
    }

    #[test]
    fn analyze_retry_allowed_from_results_but_not_error() {
        let mut machine = machine_with_file();
        let _ = insight_at_results(&mut machine);
        let step = send(&mut machine, Command::Analyze);
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Analyzing));
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Err("boom".into()),
        });
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Error));

        // Error is terminal within the sub-machine.
        let step = send(&mut machine, Command::Analyze);
        assert!(!step.changed);
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Error));
    }

    // ── Flow mode ───────────────────────────────────────────────────────

    #[test]
    fn process_dispatches_flow_for_selected_function() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartFlow);
        let step = send(
            &mut machine,
            Command::Process {
                function_name: Some("getUser".into()),
            },
        );
        assert_eq!(machine.state(), ModeState::Flow(FlowState::Processing));
        assert_eq!(
            machine.context().selected_function.as_deref(),
            Some("getUser")
        );
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Flow(FlowResult::default())),
        });
        assert_eq!(machine.state(), ModeState::Flow(FlowState::Completed));
        assert!(machine.context().flow_results.is_some());
    }

    #[test]
    fn process_without_function_is_precondition_failure() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartFlow);
        let step = send(&mut machine, Command::Process { function_name: None });
        assert!(step.effects.is_empty());
        assert_eq!(machine.state(), ModeState::Flow(FlowState::Error));
        assert!(machine.context().error_message.is_some());
    }

    #[test]
    fn process_falls_back_to_selected_function() {
        let mut machine = Machine::new();
        let _ = send(
            &mut machine,
            Command::UpdateSelectedFunction {
                function_name: "getUser".into(),
            },
        );
        let _ = send(&mut machine, Command::StartFlow);
        let step = send(&mut machine, Command::Process { function_name: None });
        assert_matches!(
            &step.effects[..],
            [Effect::Dispatch(OperationRequest {
                kind: OperationKind::GenerateFlow { function_name },
                ..
            })] if function_name == "getUser"
        );
    }

    // ── Live trace mode ─────────────────────────────────────────────────

    #[test]
    fn trace_dispatches_session_and_opens_stream() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartLiveTrace);
        let step = send(&mut machine, Command::Trace);
        assert_eq!(
            machine.state(),
            ModeState::LiveTrace(LiveTraceState::Tracing)
        );
        assert_eq!(step.effects.len(), 2);
        assert_matches!(step.effects[0], Effect::Dispatch(_));
        assert_eq!(step.effects[1], Effect::OpenEventStream);
    }

    #[test]
    fn scenario_c_live_events_append_without_transition() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartLiveTrace);
        let _ = send(&mut machine, Command::Trace);

        for i in 0..3 {
            let step = send(
                &mut machine,
                Command::AddLiveEvent {
                    event: live_event(&format!("event {i}")),
                },
            );
            assert!(step.changed);
            assert!(step.effects.is_empty());
        }
        assert_eq!(
            machine.state(),
            ModeState::LiveTrace(LiveTraceState::Tracing)
        );
        let events = &machine.context().live_events;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].message, "event 0");
        assert_eq!(events[2].message, "event 2");
    }

    #[test]
    fn live_events_outside_tracing_are_dropped() {
        let mut machine = Machine::new();
        let step = send(
            &mut machine,
            Command::AddLiveEvent {
                event: live_event("too early"),
            },
        );
        assert!(!step.changed);
        assert!(machine.context().live_events.is_empty());
    }

    #[test]
    fn trace_completion_records_result_and_closes_stream() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartLiveTrace);
        let step = send(&mut machine, Command::Trace);
        let op = dispatched(&step);
        let _ = send(
            &mut machine,
            Command::AddLiveEvent {
                event: live_event("one"),
            },
        );

        let step = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Trace(TraceResult {
                session_id: "t1".into(),
                events_captured: 1,
                message: None,
            })),
        });
        assert_eq!(
            machine.state(),
            ModeState::LiveTrace(LiveTraceState::Completed)
        );
        assert!(step.effects.contains(&Effect::CloseEventStream));
        assert!(machine.context().trace_results.is_some());
    }

    #[test]
    fn trace_failure_keeps_collected_events() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartLiveTrace);
        let step = send(&mut machine, Command::Trace);
        let op = dispatched(&step);
        let _ = send(
            &mut machine,
            Command::AddLiveEvent {
                event: live_event("kept"),
            },
        );

        let step = machine.apply(Input::Completion {
            op,
            outcome: Err("tracer crashed".into()),
        });
        assert_eq!(machine.state(), ModeState::LiveTrace(LiveTraceState::Error));
        assert!(step.effects.contains(&Effect::CloseEventStream));
        assert_eq!(machine.context().live_events.len(), 1);
    }

    #[test]
    fn stream_failure_surfaces_error_without_losing_events() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartLiveTrace);
        let _ = send(&mut machine, Command::Trace);
        let _ = send(
            &mut machine,
            Command::AddLiveEvent {
                event: live_event("kept"),
            },
        );

        let step = machine.apply(Input::StreamFailed {
            message: "connection reset".into(),
        });
        assert!(step.changed);
        assert_eq!(
            machine.state(),
            ModeState::LiveTrace(LiveTraceState::Tracing)
        );
        assert!(
            machine
                .context()
                .error_message
                .as_ref()
                .unwrap()
                .contains("connection reset")
        );
        assert_eq!(machine.context().live_events.len(), 1);
    }

    // ── Hotswap mode ────────────────────────────────────────────────────

    fn hotswap_ready() -> Machine {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartHotswap);
        let _ = send(
            &mut machine,
            Command::SetHotswapTarget {
                state_id: "s1".into(),
                new_code: "fix".into(),
            },
        );
        machine
    }

    #[test]
    fn set_hotswap_target_populates_both_fields() {
        let machine = hotswap_ready();
        assert_eq!(machine.context().state_id.as_deref(), Some("s1"));
        assert_eq!(machine.context().new_code.as_deref(), Some("fix"));
        assert_eq!(machine.state(), ModeState::Hotswap(HotswapState::Idle));
    }

    #[test]
    fn scenario_d_successful_swap_appends_one_history_entry() {
        let mut machine = hotswap_ready();
        let step = send(&mut machine, Command::Swap);
        assert_eq!(machine.state(), ModeState::Hotswap(HotswapState::Swapping));
        let op = dispatched(&step);

        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Hotswap(HotswapResult {
                status: "success".into(),
                message: "Hotswap operation successful for stateId: s1".into(),
            })),
        });
        assert_eq!(machine.state(), ModeState::Hotswap(HotswapState::Completed));
        assert!(machine.context().hotswap_results.is_some());
        assert_eq!(machine.context().hotswap_history.len(), 1);
        assert!(machine.context().hotswap_history[0]
            .details
            .contains("stateId: s1"));
    }

    #[test]
    fn failed_swap_appends_no_history() {
        let mut machine = hotswap_ready();
        let step = send(&mut machine, Command::Swap);
        let op = dispatched(&step);

        let _ = machine.apply(Input::Completion {
            op,
            outcome: Err("incompatible bytecode".into()),
        });
        assert_eq!(machine.state(), ModeState::Hotswap(HotswapState::Error));
        assert!(machine.context().hotswap_history.is_empty());
        assert!(machine.context().error_message.is_some());
    }

    #[test]
    fn swap_without_target_is_precondition_failure() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartHotswap);
        let step = send(&mut machine, Command::Swap);
        assert!(step.effects.is_empty());
        assert_eq!(machine.state(), ModeState::Hotswap(HotswapState::Error));
    }

    #[test]
    fn rollback_dispatches_and_records_target() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartHotswap);
        let step = send(
            &mut machine,
            Command::Rollback {
                state_id: "s9".into(),
            },
        );
        assert_matches!(
            &step.effects[..],
            [Effect::Dispatch(OperationRequest {
                kind: OperationKind::Rollback { state_id },
                ..
            })] if state_id == "s9"
        );
        assert_eq!(machine.context().state_id.as_deref(), Some("s9"));
    }

    #[test]
    fn apply_fix_populates_context_fields() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartHotswap);
        let _ = send(
            &mut machine,
            Command::ApplyFix {
                state_id: "s2".into(),
                new_code: "patched".into(),
            },
        );
        assert_eq!(machine.state(), ModeState::Hotswap(HotswapState::Swapping));
        assert_eq!(machine.context().state_id.as_deref(), Some("s2"));
        assert_eq!(machine.context().new_code.as_deref(), Some("patched"));
    }

    #[test]
    fn second_swap_allowed_after_completion() {
        let mut machine = hotswap_ready();
        let step = send(&mut machine, Command::Swap);
        let op = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Hotswap(HotswapResult {
                status: "success".into(),
                message: "ok".into(),
            })),
        });

        let step = send(&mut machine, Command::Swap);
        assert_eq!(machine.state(), ModeState::Hotswap(HotswapState::Swapping));
        assert_ne!(dispatched(&step), op);
    }

    // ── Single in-flight operation ──────────────────────────────────────

    #[test]
    fn no_second_dispatch_while_one_outstanding() {
        let mut machine = machine_with_file();
        let _ = send(&mut machine, Command::StartInsight);
        let step = send(&mut machine, Command::Analyze);
        let _ = dispatched(&step);

        // Re-sending analyze in `analyzing` dispatches nothing.
        let step = send(&mut machine, Command::Analyze);
        assert!(step.effects.is_empty());
        assert!(!step.changed);
        assert!(machine.has_pending());
    }

    // ── Cancellation & stale completions ────────────────────────────────

    #[test]
    fn scenario_e_stale_completion_after_exit_is_discarded() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartFlow);
        let step = send(
            &mut machine,
            Command::Process {
                function_name: Some("slowFn".into()),
            },
        );
        let op = dispatched(&step);

        let step = send(&mut machine, Command::Exit);
        assert!(step.effects.contains(&Effect::CancelOperation));
        assert_eq!(machine.state(), ModeState::Idle);
        let before = machine.snapshot();

        // The cancelled operation resolves late.
        let step = machine.apply(Input::Completion {
            op,
            outcome: Ok(Out::Flow(FlowResult::default())),
        });
        assert!(!step.changed);
        assert_eq!(machine.snapshot(), before);
        assert!(machine.context().flow_results.is_none());
    }

    #[test]
    fn completion_for_superseded_operation_is_discarded() {
        let mut machine = machine_with_file();
        let _ = send(&mut machine, Command::StartInsight);
        let step = send(&mut machine, Command::Analyze);
        let first = dispatched(&step);
        let _ = machine.apply(Input::Completion {
            op: first,
            outcome: Err("transient".into()),
        });
        let _ = send(&mut machine, Command::Exit);
        let _ = send(&mut machine, Command::StartInsight);
        let step = send(&mut machine, Command::Analyze);
        let second = dispatched(&step);
        assert_ne!(first, second);

        // The old id no longer matches.
        let step = machine.apply(Input::Completion {
            op: first,
            outcome: Ok(Out::Analysis(AnalysisResult::default())),
        });
        assert!(!step.changed);
        assert_eq!(machine.state(), ModeState::Insight(InsightState::Analyzing));
    }

    // ── Exit cleanup ────────────────────────────────────────────────────

    #[test]
    fn exit_clears_mode_results_and_error() {
        let mut machine = machine_with_file();
        let _ = insight_at_results(&mut machine);
        assert!(machine.context().analysis_results.is_some());

        let step = send(&mut machine, Command::Exit);
        assert_eq!(machine.state(), ModeState::Idle);
        assert!(machine.context().analysis_results.is_none());
        assert!(machine.context().error_message.is_none());
        assert!(step.effects.contains(&Effect::StopInstrumentation));
    }

    #[test]
    fn exit_from_live_trace_closes_stream_and_keeps_events() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartLiveTrace);
        let _ = send(&mut machine, Command::Trace);
        let _ = send(
            &mut machine,
            Command::AddLiveEvent {
                event: live_event("kept"),
            },
        );

        let step = send(&mut machine, Command::Exit);
        assert!(step.effects.contains(&Effect::CancelOperation));
        assert!(step.effects.contains(&Effect::CloseEventStream));
        assert!(step.effects.contains(&Effect::StopInstrumentation));
        assert_eq!(machine.state(), ModeState::Idle);
        // liveEvents are cleared only by clearLiveEvents.
        assert_eq!(machine.context().live_events.len(), 1);
    }

    // ── Context-scoped commands ─────────────────────────────────────────

    #[test]
    fn context_commands_work_in_any_state() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartFlow);

        let step = send(
            &mut machine,
            Command::UpdateCurrentFile {
                file: PathBuf::from("a.rs"),
            },
        );
        assert!(step.changed);
        assert_eq!(machine.state(), ModeState::Flow(FlowState::Idle));

        let entry = devtrace_core::context::HotswapHistoryEntry {
            timestamp: chrono::Utc::now(),
            details: "manual".into(),
        };
        let _ = send(&mut machine, Command::AddHotswapHistoryEntry { entry });
        assert_eq!(machine.context().hotswap_history.len(), 1);

        let _ = send(&mut machine, Command::ClearHotswapHistory);
        assert!(machine.context().hotswap_history.is_empty());

        let config = devtrace_core::context::ProviderConfig {
            provider: devtrace_core::context::AiProvider::Anthropic,
            api_key: "sk-test".into(),
        };
        let _ = send(&mut machine, Command::UpdateProviderConfig { config });
        assert_eq!(
            machine.context().provider_config.provider,
            devtrace_core::context::AiProvider::Anthropic
        );
    }

    #[test]
    fn clear_live_events_resets_log() {
        let mut machine = Machine::new();
        let _ = send(&mut machine, Command::StartLiveTrace);
        let _ = send(&mut machine, Command::Trace);
        let _ = send(
            &mut machine,
            Command::AddLiveEvent {
                event: live_event("x"),
            },
        );
        assert_eq!(machine.context().live_events.len(), 1);

        let _ = send(&mut machine, Command::ClearLiveEvents);
        assert!(machine.context().live_events.is_empty());
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    #[test]
    fn snapshot_reflects_mode_and_sub_mode() {
        let mut machine = machine_with_file();
        let _ = send(&mut machine, Command::StartInsight);
        let _ = send(&mut machine, Command::Analyze);
        let snap = machine.snapshot();
        assert_eq!(snap.state_value(), "insightMode.analyzing");
    }
}
