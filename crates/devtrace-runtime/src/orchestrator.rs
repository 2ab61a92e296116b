//! The orchestrator event loop.
//!
//! A single task owns the [`Machine`] and drains one ordered input queue, so
//! every transition and context mutation is serialized; no other task ever
//! holds the context. Commands from callers, operation completions from the
//! [`Dispatcher`], and live events from the ingestor all enter through that
//! queue.
//!
//! The loop executes the machine's effects: spawning operations, cancelling
//! them, opening and closing the live event subscription, and toggling
//! runtime instrumentation. After every state or context change it publishes
//! a [`StateSnapshot`] through the [`StateNotifier`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use devtrace_core::command::Command;
use devtrace_core::context::Context;
use devtrace_core::snapshot::StateSnapshot;

use crate::client::{LiveEventSource, RuntimeClient};
use crate::dispatcher::Dispatcher;
use crate::errors::RuntimeError;
use crate::ingestor;
use crate::machine::{Effect, Input, Machine, Step};
use crate::notifier::StateNotifier;

/// Tunables for the orchestrator loop.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Input queue capacity.
    pub command_capacity: usize,
    /// Snapshot broadcast capacity.
    pub snapshot_capacity: usize,
    /// Bound on request-style operations. `None` leaves them unbounded;
    /// the trace session is always unbounded.
    pub op_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            snapshot_capacity: 256,
            op_timeout: None,
        }
    }
}

/// Handle to a running orchestrator.
///
/// Cheap to clone; all clones feed the same loop. Dropping every handle does
/// not stop the loop — call [`OrchestratorHandle::shutdown`].
#[derive(Clone)]
pub struct OrchestratorHandle {
    inputs: mpsc::Sender<Input>,
    notifier: Arc<StateNotifier>,
    snapshot: Arc<Mutex<StateSnapshot>>,
    shutdown: CancellationToken,
}

impl OrchestratorHandle {
    /// Enqueue a command. Resolves once the command is accepted into the
    /// queue, not once it is applied.
    pub async fn send(&self, command: Command) -> Result<(), RuntimeError> {
        self.inputs
            .send(Input::Command(command))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Subscribe to snapshots published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateSnapshot> {
        self.notifier.subscribe()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        self.snapshot.lock().clone()
    }

    /// Stop the loop and every task it spawned.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// The mode-orchestration runtime.
pub struct Orchestrator;

impl Orchestrator {
    /// Start the orchestrator loop with an empty context.
    pub fn spawn(
        client: Arc<dyn RuntimeClient>,
        source: Arc<dyn LiveEventSource>,
        config: OrchestratorConfig,
    ) -> OrchestratorHandle {
        Self::spawn_with_context(client, source, config, Context::default())
    }

    /// Start the orchestrator loop with a pre-populated context (e.g.
    /// provider configuration).
    pub fn spawn_with_context(
        client: Arc<dyn RuntimeClient>,
        source: Arc<dyn LiveEventSource>,
        config: OrchestratorConfig,
        context: Context,
    ) -> OrchestratorHandle {
        let (inputs, rx) = mpsc::channel(config.command_capacity);
        let notifier = Arc::new(StateNotifier::with_capacity(config.snapshot_capacity));
        let machine = Machine::with_context(context);
        let snapshot = Arc::new(Mutex::new(machine.snapshot()));
        let shutdown = CancellationToken::new();

        let loop_task = EventLoop {
            machine,
            dispatcher: Dispatcher::new(Arc::clone(&client), inputs.clone(), config.op_timeout),
            client,
            source,
            inputs: inputs.clone(),
            notifier: Arc::clone(&notifier),
            snapshot: Arc::clone(&snapshot),
            shutdown: shutdown.clone(),
            op_cancel: None,
            ingest: None,
        };
        let _ = tokio::spawn(loop_task.run(rx));

        OrchestratorHandle {
            inputs,
            notifier,
            snapshot,
            shutdown,
        }
    }
}

struct EventLoop {
    machine: Machine,
    dispatcher: Dispatcher,
    client: Arc<dyn RuntimeClient>,
    source: Arc<dyn LiveEventSource>,
    inputs: mpsc::Sender<Input>,
    notifier: Arc<StateNotifier>,
    snapshot: Arc<Mutex<StateSnapshot>>,
    shutdown: CancellationToken,
    /// Cancels the outstanding operation's task-side work.
    op_cancel: Option<CancellationToken>,
    /// Cancels the live event ingestion task.
    ingest: Option<(CancellationToken, JoinHandle<()>)>,
}

impl EventLoop {
    async fn run(mut self, mut rx: mpsc::Receiver<Input>) {
        debug!("orchestrator loop started");
        loop {
            let input = tokio::select! {
                () = self.shutdown.cancelled() => break,
                input = rx.recv() => match input {
                    Some(input) => input,
                    None => break,
                },
            };
            let step = self.machine.apply(input);
            self.execute(step);
        }
        self.stop_tasks();
        debug!("orchestrator loop stopped");
    }

    fn execute(&mut self, step: Step) {
        for effect in step.effects {
            match effect {
                Effect::Dispatch(request) => {
                    let cancel = CancellationToken::new();
                    self.op_cancel = Some(cancel.clone());
                    self.dispatcher.dispatch(request, cancel);
                }
                Effect::CancelOperation => {
                    if let Some(cancel) = self.op_cancel.take() {
                        cancel.cancel();
                    }
                }
                Effect::OpenEventStream => {
                    let cancel = CancellationToken::new();
                    let task =
                        ingestor::spawn(Arc::clone(&self.source), self.inputs.clone(), cancel.clone());
                    self.ingest = Some((cancel, task));
                }
                Effect::CloseEventStream => {
                    if let Some((cancel, _)) = self.ingest.take() {
                        cancel.cancel();
                    }
                }
                Effect::StartInstrumentation => self.instrumentation(true),
                Effect::StopInstrumentation => self.instrumentation(false),
            }
        }
        if step.changed {
            let snapshot = self.machine.snapshot();
            *self.snapshot.lock() = snapshot.clone();
            let _ = self.notifier.publish(snapshot);
        }
    }

    /// Instrumentation toggles are best-effort and never block the loop.
    fn instrumentation(&self, start: bool) {
        let client = Arc::clone(&self.client);
        let _ = tokio::spawn(async move {
            let result = if start {
                client.start_instrumentation().await
            } else {
                client.stop_instrumentation().await
            };
            if let Err(e) = result {
                warn!(start, error = %e, "instrumentation toggle failed");
            }
        });
    }

    fn stop_tasks(&mut self) {
        if let Some(cancel) = self.op_cancel.take() {
            cancel.cancel();
        }
        if let Some((cancel, _)) = self.ingest.take() {
            cancel.cancel();
        }
    }
}
