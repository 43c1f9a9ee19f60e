//! Single-worker command dispatcher
//!
//! Parsed commands are handed to one worker task through a one-slot channel,
//! so device operations run strictly one at a time and in submission order.
//! Each submission carries a reply channel; the submitter waits on it for the
//! command's own result or error.
//!
//! Cancellation is observed between commands only: a command that has started
//! always runs to completion.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ConsoleError, ExecutionError, Result};
use crate::executor::ExecutionResult;
use crate::parser::Command;

/// Executes one command on behalf of the worker
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: Command) -> Result<ExecutionResult>;
}

/// Lifecycle of a [`Dispatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Created,
    Started,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatcherState::Created => "created",
            DispatcherState::Started => "started",
            DispatcherState::Running => "running",
            DispatcherState::Stopping => "stopping",
            DispatcherState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct Submission {
    command: Command,
    done: oneshot::Sender<Result<ExecutionResult>>,
}

type SharedState = Arc<Mutex<DispatcherState>>;

fn set_state(state: &SharedState, next: DispatcherState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

fn stopped() -> ConsoleError {
    ExecutionError::DispatcherStopped.into()
}

/// Queue plus one worker serializing command execution
pub struct Dispatcher {
    executor: Arc<dyn CommandExecutor>,
    token: CancellationToken,
    state: SharedState,
    sender: Mutex<Option<mpsc::Sender<Submission>>>,
    receiver: Mutex<Option<mpsc::Receiver<Submission>>>,
    /// Held across the await in `stop` so concurrent stops all wait for the worker
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Create a dispatcher whose lifetime is bounded by `parent`
    ///
    /// # Arguments
    /// * `executor` - Runs each submitted command
    /// * `parent` - Session token; cancelling it stops the worker too
    pub fn new(executor: Arc<dyn CommandExecutor>, parent: &CancellationToken) -> Self {
        let (sender, receiver) = mpsc::channel(1);
        Self {
            executor,
            token: parent.child_token(),
            state: Arc::new(Mutex::new(DispatcherState::Created)),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            worker: tokio::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the worker. Only the first call has an effect.
    pub async fn start(&self) -> Result<()> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(receiver) = receiver else {
            return Err(ConsoleError::Generic(format!(
                "Dispatcher cannot start, it is {}",
                self.state()
            )));
        };

        set_state(&self.state, DispatcherState::Started);
        let handle = tokio::spawn(run_worker(
            receiver,
            self.executor.clone(),
            self.token.clone(),
            self.state.clone(),
        ));
        *self.worker.lock().await = Some(handle);
        info!("Command dispatcher started");
        Ok(())
    }

    /// Execute a command on the worker and wait for its result
    ///
    /// # Arguments
    /// * `command` - Parsed command
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - The command's own result, or `DispatcherStopped`
    pub async fn submit(&self, command: Command) -> Result<ExecutionResult> {
        if !matches!(
            self.state(),
            DispatcherState::Started | DispatcherState::Running
        ) {
            return Err(stopped());
        }
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(stopped)?;

        debug!("Submitting '{}'", command.name());
        let (done, reply) = oneshot::channel();
        tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(stopped()),
            sent = sender.send(Submission { command, done }) => sent.map_err(|_| stopped())?,
        }
        drop(sender);

        // The worker drops `done` without replying only when it exits first
        reply.await.map_err(|_| stopped())?
    }

    /// Cancel the worker and wait until it has exited. Safe to call repeatedly.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        if self.state() != DispatcherState::Stopped {
            set_state(&self.state, DispatcherState::Stopping);
        }
        self.token.cancel();
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                warn!("Dispatcher worker ended abnormally: {}", e);
            }
            info!("Command dispatcher stopped");
        }
        set_state(&self.state, DispatcherState::Stopped);
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<Submission>,
    executor: Arc<dyn CommandExecutor>,
    token: CancellationToken,
    state: SharedState,
) {
    set_state(&state, DispatcherState::Running);
    loop {
        let submission = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = receiver.recv() => match next {
                Some(submission) => submission,
                None => break,
            },
        };

        if matches!(submission.command, Command::Quit) {
            let _ = submission.done.send(Ok(ExecutionResult::message("Bye")));
            debug!("Quit received, worker exiting");
            break;
        }

        let name = submission.command.name();
        let result = executor.execute(submission.command).await;
        if let Err(e) = &result {
            warn!("'{}' failed: {}", name, e);
        }
        // The submitter may have gone away; nothing to do then
        let _ = submission.done.send(result);
    }
    set_state(&state, DispatcherState::Stopped);
}
