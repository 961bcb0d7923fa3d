//! Runs a coordinator on its own task so ticks and user commands share one timeline

use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinError, JoinHandle},
};
use tracing::{debug, error, warn};

use super::{
    listener::ReconnectListener,
    reconnect::{FailureReport, ReconnectCoordinator},
};
use crate::{
    error::Result,
    state::Outcome,
    tasks::{CountdownTimer, Tick},
};

/// User intents forwarded from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RetryNow,
    Cancel,
}

/// A queued command and where to report whether it resolved the cycle
#[derive(Debug)]
struct Request {
    command: Command,
    ack: oneshot::Sender<bool>,
}

/// Pending answer to a queued command.
///
/// Resolves to `true` only if that command is what resolved the coordinator.
/// A command that lands after expiry, after another command, or after the
/// coordinator went away resolves to `false`.
#[derive(Debug, Default)]
pub struct CommandAck {
    rx: Option<oneshot::Receiver<bool>>,
}

impl CommandAck {
    pub async fn resolved(self) -> bool {
        match self.rx {
            // A dropped sender means the task exited without reading the command
            Some(rx) => rx.await.unwrap_or(false),
            None => false,
        }
    }
}

/// Caller-side handle to a running coordinator.
///
/// Dropping the handle before the coordinator resolves abandons the attempt:
/// the task ends, the timer is released and no outcome is emitted.
#[derive(Debug)]
pub struct CoordinatorHandle {
    command_tx: mpsc::UnboundedSender<Request>,
    task: JoinHandle<Option<Outcome>>,
}

impl CoordinatorHandle {
    /// Ask for an immediate retry; `true` if it resolved the coordinator
    pub async fn request_immediate_retry(&self) -> bool {
        self.enqueue(Command::RetryNow).resolved().await
    }

    /// Ask to cancel; `true` if it resolved the coordinator
    pub async fn request_cancel(&self) -> bool {
        self.enqueue(Command::Cancel).resolved().await
    }

    /// Queue a command without waiting for the coordinator to handle it
    pub fn enqueue(&self, command: Command) -> CommandAck {
        let (ack, rx) = oneshot::channel();
        match self.command_tx.send(Request { command, ack }) {
            Ok(()) => CommandAck { rx: Some(rx) },
            Err(_) => {
                debug!("Coordinator already finished, ignoring {:?}", command);
                CommandAck::default()
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the coordinator to finish.
    ///
    /// `Ok(None)` means it was abandoned without an outcome; `Err` means the
    /// task panicked or was aborted.
    pub async fn outcome(self) -> std::result::Result<Option<Outcome>, JoinError> {
        self.task.await.map_err(|e| {
            error!("Coordinator task failed: {}", e);
            e
        })
    }

    /// Give up on the attempt without waiting for an outcome
    pub fn abandon(self) {
        debug!("Abandoning reconnect coordinator");
    }
}

/// Build a coordinator for `report` and drive it on a new task.
///
/// Validation happens before anything is spawned, so an invalid countdown
/// returns an error and never reaches the listener.
pub fn spawn_coordinator<L>(report: FailureReport, listener: L) -> Result<CoordinatorHandle>
where
    L: ReconnectListener + Send + 'static,
{
    let (timer, tick_rx) = CountdownTimer::channel();
    let coordinator = ReconnectCoordinator::new(report, timer, listener)?;
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run_coordinator(coordinator, tick_rx, command_rx));

    Ok(CoordinatorHandle { command_tx, task })
}

async fn run_coordinator<L>(
    mut coordinator: ReconnectCoordinator<CountdownTimer, L>,
    mut tick_rx: mpsc::UnboundedReceiver<Tick>,
    mut command_rx: mpsc::UnboundedReceiver<Request>,
) -> Option<Outcome>
where
    L: ReconnectListener,
{
    while !coordinator.is_resolved() {
        tokio::select! {
            // Commands first: a click that is already queued beats a tick
            // that became due at the same moment.
            biased;

            request = command_rx.recv() => match request {
                Some(Request { command, ack }) => {
                    let resolved = match command {
                        Command::RetryNow => coordinator.request_immediate_retry(),
                        Command::Cancel => coordinator.request_cancel(),
                    };
                    if ack.send(resolved).is_err() {
                        debug!("Caller stopped waiting for {:?}", command);
                    }
                }
                None => {
                    debug!("Coordinator handle dropped");
                    break;
                }
            },

            tick = tick_rx.recv() => match tick {
                Some(Tick) => coordinator.on_tick(),
                None => {
                    warn!("Countdown timer closed unexpectedly");
                    break;
                }
            },
        }
    }

    coordinator.outcome()
}
