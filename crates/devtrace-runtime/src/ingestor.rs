//! Live event ingestion task.
//!
//! Spawned when the machine enters the `tracing` sub-state and stopped when
//! it leaves. The task subscribes to the [`LiveEventSource`], normalizes each
//! raw event, and forwards it into the orchestrator's input queue as an
//! ordinary `addLiveEvent` command, so event appends serialize with every
//! other context mutation.
//!
//! The subscription lives exactly as long as the task: cancelling the token
//! drops the stream, which releases the underlying handle.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use devtrace_core::command::Command;
use devtrace_core::events::LiveEvent;

use crate::client::LiveEventSource;
use crate::machine::Input;

/// Spawn the ingestion task. Returns its handle; stop it via `cancel`.
pub fn spawn(
    source: Arc<dyn LiveEventSource>,
    inputs: mpsc::Sender<Input>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = match source.subscribe().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "live event subscription failed");
                let _ = inputs
                    .send(Input::StreamFailed {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };
        debug!("live event stream open");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("live event stream released");
                    return;
                }
                item = stream.next() => match item {
                    Some(Ok(raw)) => {
                        let event = LiveEvent::from_raw(raw);
                        let command = Command::AddLiveEvent { event };
                        if inputs.send(Input::Command(command)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "live event stream error");
                        let _ = inputs
                            .send(Input::StreamFailed { message: e.to_string() })
                            .await;
                        return;
                    }
                    None => {
                        debug!("live event stream ended upstream");
                        return;
                    }
                },
            }
        }
    })
}
