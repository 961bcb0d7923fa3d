//! The reconnect coordinator state machine

use tracing::{debug, info, warn};

use super::listener::ReconnectListener;
use crate::{
    error::{CoordinatorError, Result, MIN_COUNTDOWN_SECONDS},
    state::{CountdownState, Outcome, Phase, RetryMode},
    tasks::TickSource,
};

/// Countdown used when the failure handler does not pick one
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 5;

/// What the connection manager reports when a session drops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub error_message: String,
    pub retry_mode: RetryMode,
    pub countdown_seconds: u32,
}

impl FailureReport {
    pub fn new(error_message: impl Into<String>, retry_mode: RetryMode) -> Self {
        Self {
            error_message: error_message.into(),
            retry_mode,
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
        }
    }

    pub fn with_countdown(mut self, countdown_seconds: u32) -> Self {
        self.countdown_seconds = countdown_seconds;
        self
    }
}

/// One-shot coordinator for a single disconnect.
///
/// Counts down once per tick and resolves on the first of expiry, an
/// immediate retry or a cancel. Every later tick or command is ignored.
/// The timer runs exactly while the coordinator is counting down.
pub struct ReconnectCoordinator<T: TickSource, L: ReconnectListener> {
    state: CountdownState,
    timer: T,
    listener: L,
}

impl<T: TickSource, L: ReconnectListener> ReconnectCoordinator<T, L> {
    /// Start a countdown for `report`.
    ///
    /// The listener sees the starting value before the timer is started.
    pub fn new(report: FailureReport, timer: T, listener: L) -> Result<Self> {
        if report.countdown_seconds < MIN_COUNTDOWN_SECONDS {
            return Err(CoordinatorError::invalid_countdown(report.countdown_seconds));
        }

        info!(
            "Connection interrupted ({}), {} retry in {}s",
            report.error_message, report.retry_mode, report.countdown_seconds
        );

        let mut coordinator = Self {
            state: CountdownState::new(
                report.error_message,
                report.retry_mode,
                report.countdown_seconds,
            ),
            timer,
            listener,
        };

        coordinator
            .listener
            .on_countdown_updated(coordinator.state.remaining_seconds);
        coordinator.timer.start();
        Ok(coordinator)
    }

    /// Advance the countdown by one tick
    pub fn on_tick(&mut self) {
        let Some(remaining) = self.state.decrement() else {
            debug!("Ignoring tick after resolution");
            return;
        };

        if remaining == 0 {
            info!("Countdown expired");
            self.resolve(Outcome::Retry(self.state.retry_mode));
        } else {
            debug!("Retrying in {}s", remaining);
            self.listener.on_countdown_updated(remaining);
        }
    }

    /// Retry now with the mode chosen at construction.
    ///
    /// Returns `true` if this call resolved the coordinator.
    pub fn request_immediate_retry(&mut self) -> bool {
        if self.state.is_resolved() {
            debug!("Ignoring retry request after resolution");
            return false;
        }
        info!(
            "Immediate retry requested with {}s remaining",
            self.state.remaining_seconds
        );
        self.resolve(Outcome::Retry(self.state.retry_mode));
        true
    }

    /// Abandon the reconnect attempt.
    ///
    /// Returns `true` if this call resolved the coordinator.
    pub fn request_cancel(&mut self) -> bool {
        if self.state.is_resolved() {
            debug!("Ignoring cancel request after resolution");
            return false;
        }
        info!(
            "Reconnect cancelled with {}s remaining",
            self.state.remaining_seconds
        );
        self.resolve(Outcome::Cancel);
        true
    }

    fn resolve(&mut self, outcome: Outcome) {
        self.timer.stop();
        if !self.state.resolve(outcome) {
            return;
        }

        match outcome {
            Outcome::Retry(mode) => {
                info!("Requesting {} reconnect", mode);
                self.listener.on_retry_requested(mode);
            }
            Outcome::Cancel => {
                info!("Reconnect abandoned by request");
                self.listener.on_cancel_requested();
            }
        }
    }

    pub fn state(&self) -> &CountdownState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds
    }

    pub fn retry_mode(&self) -> RetryMode {
        self.state.retry_mode
    }

    pub fn error_message(&self) -> &str {
        &self.state.error_message
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }
}

impl<T: TickSource, L: ReconnectListener> Drop for ReconnectCoordinator<T, L> {
    fn drop(&mut self) {
        if self.state.is_counting_down() {
            warn!(
                "Reconnect coordinator dropped with {}s remaining, attempt abandoned",
                self.state.remaining_seconds
            );
        }
        self.timer.stop();
    }
}
