//! Executes dispatched operations on their own tasks.
//!
//! The [`Dispatcher`] turns an [`OperationRequest`] into the matching
//! [`RuntimeClient`] call, runs it on a spawned task, and feeds the outcome
//! back into the orchestrator's input queue as an [`Input::Completion`].
//!
//! A completion is always delivered, even for a cancelled or superseded
//! operation; the machine's [`OpId`](crate::machine::OpId) check is what
//! discards stale results. Cancellation is cooperative: the token is handed
//! to the long-lived trace session, and a cancelled request-style operation
//! simply resolves late and is discarded on arrival.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{ClientResult, RuntimeClient};
use crate::errors::RuntimeError;
use crate::machine::{Input, OperationKind, OperationOutput, OperationRequest};

/// Runs operations against a [`RuntimeClient`] and reports completions.
pub struct Dispatcher {
    client: Arc<dyn RuntimeClient>,
    inputs: mpsc::Sender<Input>,
    op_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher that reports completions into `inputs`.
    ///
    /// `op_timeout` bounds every request-style operation; the long-lived
    /// trace session is exempt.
    pub fn new(
        client: Arc<dyn RuntimeClient>,
        inputs: mpsc::Sender<Input>,
        op_timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            inputs,
            op_timeout,
        }
    }

    /// Start `request` on its own task.
    pub fn dispatch(&self, request: OperationRequest, cancel: CancellationToken) {
        let client = Arc::clone(&self.client);
        let inputs = self.inputs.clone();
        let op_timeout = self.op_timeout;
        let OperationRequest { op, kind } = request;

        let _ = tokio::spawn(async move {
            let outcome = run_operation(client.as_ref(), kind, cancel, op_timeout).await;
            if inputs.send(Input::Completion { op, outcome }).await.is_err() {
                debug!(%op, "orchestrator gone; completion dropped");
            }
        });
    }
}

/// Map the operation onto the client and normalize the outcome.
async fn run_operation(
    client: &dyn RuntimeClient,
    kind: OperationKind,
    cancel: CancellationToken,
    op_timeout: Option<Duration>,
) -> Result<OperationOutput, String> {
    // The trace session runs until the tracer ends it or the token fires,
    // so a request timeout would only cut sessions short.
    let bounded = !matches!(kind, OperationKind::StartTrace);

    let work = execute(client, kind, cancel);
    let result = match (bounded, op_timeout) {
        (true, Some(limit)) => match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => return Err(RuntimeError::Timeout(limit).to_string()),
        },
        _ => work.await,
    };
    result.map_err(|e| e.to_string())
}

async fn execute(
    client: &dyn RuntimeClient,
    kind: OperationKind,
    cancel: CancellationToken,
) -> ClientResult<OperationOutput> {
    match kind {
        OperationKind::Analyze { file } => {
            client.analyze(&file).await.map(OperationOutput::Analysis)
        }
        OperationKind::GenerateFlow { function_name } => client
            .generate_flow(&function_name)
            .await
            .map(OperationOutput::Flow),
        OperationKind::StartTrace => {
            client.start_trace(cancel).await.map(OperationOutput::Trace)
        }
        OperationKind::PerformHotswap { state_id, new_code } => client
            .perform_hotswap(&state_id, &new_code)
            .await
            .map(OperationOutput::Hotswap),
        OperationKind::Rollback { state_id } => client
            .rollback(&state_id)
            .await
            .map(OperationOutput::Hotswap),
        OperationKind::ApplyFix { state_id, new_code } => client
            .apply_fix(&state_id, &new_code)
            .await
            .map(OperationOutput::Hotswap),
        OperationKind::PlayForward { state_id } => client
            .play_forward(&state_id)
            .await
            .map(OperationOutput::Hotswap),
        OperationKind::FetchSuggestions {
            error_message,
            file,
            config,
        } => client
            .fetch_suggestions(&error_message, &file, &config)
            .await
            .map(OperationOutput::Suggestions),
        OperationKind::ApplySuggestion { file, suggestion } => client
            .apply_suggestion(&file, &suggestion)
            .await
            .map(OperationOutput::SuggestionApplied),
    }
}
