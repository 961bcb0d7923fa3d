//! Outbound notifications from a reconnect coordinator

use tokio::sync::mpsc;
use tracing::debug;

use crate::state::RetryMode;

/// Receives everything a coordinator reports.
///
/// `on_countdown_updated` may fire many times; exactly one of
/// `on_retry_requested` / `on_cancel_requested` fires per resolved coordinator,
/// and neither fires for one that is dropped while still counting down.
pub trait ReconnectListener {
    fn on_countdown_updated(&mut self, remaining_seconds: u32);
    fn on_retry_requested(&mut self, mode: RetryMode);
    fn on_cancel_requested(&mut self);
}

/// Listener callbacks as values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorEvent {
    CountdownUpdated(u32),
    RetryRequested(RetryMode),
    CancelRequested,
}

impl CoordinatorEvent {
    /// Whether this event ends the coordinator's lifetime
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CoordinatorEvent::CountdownUpdated(_))
    }
}

/// Forwards listener callbacks onto an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<CoordinatorEvent>,
}

impl ChannelListener {
    pub fn new(tx: mpsc::UnboundedSender<CoordinatorEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CoordinatorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn forward(&self, event: CoordinatorEvent) {
        if self.tx.send(event).is_err() {
            debug!("Dropping {:?}: no one is listening", event);
        }
    }
}

impl ReconnectListener for ChannelListener {
    fn on_countdown_updated(&mut self, remaining_seconds: u32) {
        self.forward(CoordinatorEvent::CountdownUpdated(remaining_seconds));
    }

    fn on_retry_requested(&mut self, mode: RetryMode) {
        self.forward(CoordinatorEvent::RetryRequested(mode));
    }

    fn on_cancel_requested(&mut self) {
        self.forward(CoordinatorEvent::CancelRequested);
    }
}
