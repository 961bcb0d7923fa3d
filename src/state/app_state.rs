//! Shared state of the control server

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{CountdownSnapshot, Outcome, Phase, RetryMode};
use crate::{
    coordinator::{
        spawn_coordinator, Command, CommandAck, CoordinatorHandle, FailureReport,
        ReconnectListener,
    },
    error::{CoordinatorError, Result},
};

/// A terminal outcome as seen by the connection manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub failure_id: u64,
    pub outcome: Outcome,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Listener that publishes a coordinator's progress into [`AppState`] channels.
///
/// Updates from a cycle that has since been replaced are dropped, so a slow
/// abandoned coordinator can never overwrite the current countdown.
struct StatusPublisher {
    failure_id: u64,
    error_message: String,
    retry_mode: RetryMode,
    countdown_tx: Arc<watch::Sender<CountdownSnapshot>>,
    outcome_tx: broadcast::Sender<OutcomeRecord>,
    last_outcome: Arc<Mutex<Option<OutcomeRecord>>>,
}

impl StatusPublisher {
    fn publish_outcome(&self, outcome: Outcome) {
        let failure_id = self.failure_id;
        self.countdown_tx.send_if_modified(|snapshot| {
            if snapshot.failure_id > failure_id {
                return false;
            }
            snapshot.active = false;
            snapshot.phase = Some(Phase::Resolved);
            snapshot.outcome = Some(outcome);
            true
        });

        let record = OutcomeRecord {
            failure_id,
            outcome,
            error_message: self.error_message.clone(),
            timestamp: Utc::now(),
        };

        match self.last_outcome.lock() {
            Ok(mut last) => *last = Some(record.clone()),
            Err(e) => warn!("Failed to record last outcome: {}", e),
        }

        if let Err(e) = self.outcome_tx.send(record) {
            debug!("No outcome subscribers: {}", e);
        }
    }
}

impl ReconnectListener for StatusPublisher {
    fn on_countdown_updated(&mut self, remaining_seconds: u32) {
        let failure_id = self.failure_id;
        let error_message = &self.error_message;
        let retry_mode = self.retry_mode;
        self.countdown_tx.send_if_modified(|snapshot| {
            if snapshot.failure_id > failure_id {
                return false;
            }
            *snapshot = CountdownSnapshot::counting_down(
                failure_id,
                error_message.clone(),
                retry_mode,
                remaining_seconds,
            );
            true
        });
    }

    fn on_retry_requested(&mut self, mode: RetryMode) {
        self.publish_outcome(Outcome::Retry(mode));
    }

    fn on_cancel_requested(&mut self) {
        self.publish_outcome(Outcome::Cancel);
    }
}

/// Main application state: the current reconnect cycle and what it published
#[derive(Debug)]
pub struct AppState {
    /// Countdown used when a failure report does not carry one
    pub default_countdown_seconds: u32,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    next_failure_id: AtomicU64,
    /// Handle of the most recent reconnect cycle
    active: Mutex<Option<CoordinatorHandle>>,
    /// Latest countdown snapshot for the presentation layer
    pub countdown_tx: Arc<watch::Sender<CountdownSnapshot>>,
    /// Keep the receiver alive to prevent channel closure
    pub _countdown_rx: watch::Receiver<CountdownSnapshot>,
    /// Terminal outcomes for the connection manager
    pub outcome_tx: broadcast::Sender<OutcomeRecord>,
    last_outcome: Arc<Mutex<Option<OutcomeRecord>>>,
}

impl AppState {
    pub fn new(port: u16, host: String, default_countdown_seconds: u32) -> Self {
        let (countdown_tx, countdown_rx) = watch::channel(CountdownSnapshot::idle());
        let (outcome_tx, _) = broadcast::channel(100);

        Self {
            default_countdown_seconds,
            start_time: Instant::now(),
            port,
            host,
            next_failure_id: AtomicU64::new(1),
            active: Mutex::new(None),
            countdown_tx: Arc::new(countdown_tx),
            _countdown_rx: countdown_rx,
            outcome_tx,
            last_outcome: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a new reconnect cycle for a dropped connection.
    ///
    /// An unresolved previous cycle is abandoned without an outcome.
    pub fn report_failure(
        &self,
        error_message: String,
        retry_mode: RetryMode,
        countdown_seconds: Option<u32>,
    ) -> Result<CountdownSnapshot> {
        let report = FailureReport::new(error_message, retry_mode)
            .with_countdown(countdown_seconds.unwrap_or(self.default_countdown_seconds));

        let mut active = self
            .active
            .lock()
            .map_err(|e| CoordinatorError::state_lock("active coordinator", e))?;

        let failure_id = self.next_failure_id.fetch_add(1, Ordering::SeqCst);
        let publisher = StatusPublisher {
            failure_id,
            error_message: report.error_message.clone(),
            retry_mode,
            countdown_tx: Arc::clone(&self.countdown_tx),
            outcome_tx: self.outcome_tx.clone(),
            last_outcome: Arc::clone(&self.last_outcome),
        };

        let handle = spawn_coordinator(report, publisher)?;
        info!("Reconnect cycle {} started", failure_id);

        if let Some(previous) = active.replace(handle) {
            if !previous.is_finished() {
                warn!("Reconnect cycle replaced before it resolved, abandoning it");
            }
            previous.abandon();
        }
        drop(active);

        Ok(self.get_countdown())
    }

    /// Forward the "retry now" intent; `true` only if it resolved the live cycle
    pub async fn request_retry_now(&self) -> Result<bool> {
        Ok(self.enqueue(Command::RetryNow)?.resolved().await)
    }

    /// Forward the "cancel" intent; `true` only if it resolved the live cycle
    pub async fn request_cancel(&self) -> Result<bool> {
        Ok(self.enqueue(Command::Cancel)?.resolved().await)
    }

    /// Queue a command on the current cycle; the lock is released before waiting
    fn enqueue(&self, command: Command) -> Result<CommandAck> {
        let active = self
            .active
            .lock()
            .map_err(|e| CoordinatorError::state_lock("active coordinator", e))?;

        Ok(match active.as_ref() {
            Some(handle) => handle.enqueue(command),
            None => CommandAck::default(),
        })
    }

    /// Current countdown snapshot
    pub fn get_countdown(&self) -> CountdownSnapshot {
        self.countdown_tx.borrow().clone()
    }

    /// Watch countdown snapshots as they change
    pub fn watch_countdown(&self) -> watch::Receiver<CountdownSnapshot> {
        self.countdown_tx.subscribe()
    }

    pub fn subscribe_outcomes(&self) -> broadcast::Receiver<OutcomeRecord> {
        self.outcome_tx.subscribe()
    }

    pub fn get_last_outcome(&self) -> Result<Option<OutcomeRecord>> {
        self.last_outcome
            .lock()
            .map(|last| last.clone())
            .map_err(|e| CoordinatorError::state_lock("last outcome", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::new(0, "127.0.0.1".to_string(), 5)
    }

    #[tokio::test(start_paused = true)]
    async fn report_failure_publishes_starting_countdown() {
        let state = state();
        let snapshot = state
            .report_failure("tunnel closed".to_string(), RetryMode::Quick, None)
            .unwrap();

        assert_eq!(snapshot.failure_id, 1);
        assert!(snapshot.active);
        assert_eq!(snapshot.remaining_seconds, Some(5));
        assert_eq!(snapshot.retry_mode, Some(RetryMode::Quick));
        assert_eq!(snapshot.error_message.as_deref(), Some("tunnel closed"));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_countdown_leaves_state_untouched() {
        let state = state();
        let err = state
            .report_failure("x".to_string(), RetryMode::Quick, Some(0))
            .unwrap_err();

        assert!(matches!(err, CoordinatorError::InvalidCountdown { .. }));
        assert_eq!(state.get_countdown(), CountdownSnapshot::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_broadcast_and_recorded() {
        let state = state();
        let mut outcomes = state.subscribe_outcomes();
        state
            .report_failure("x".to_string(), RetryMode::Full, Some(10))
            .unwrap();

        assert!(state.request_cancel().await.unwrap());

        let record = outcomes.recv().await.unwrap();
        assert_eq!(record.outcome, Outcome::Cancel);
        assert_eq!(record.failure_id, 1);
        assert_eq!(state.get_last_outcome().unwrap(), Some(record));

        let snapshot = state.get_countdown();
        assert!(!snapshot.active);
        assert_eq!(snapshot.phase, Some(Phase::Resolved));
        assert_eq!(snapshot.outcome, Some(Outcome::Cancel));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_snapshot_follows_ticks() {
        let state = state();
        let mut countdown = state.watch_countdown();
        state
            .report_failure("x".to_string(), RetryMode::Quick, Some(3))
            .unwrap();
        countdown.mark_unchanged();

        countdown.changed().await.unwrap();
        assert_eq!(countdown.borrow().remaining_seconds, Some(2));
        countdown.changed().await.unwrap();
        assert_eq!(countdown.borrow().remaining_seconds, Some(1));
        countdown.changed().await.unwrap();
        assert_eq!(
            countdown.borrow().outcome,
            Some(Outcome::Retry(RetryMode::Quick))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn new_failure_abandons_previous_cycle() {
        let state = state();
        let mut outcomes = state.subscribe_outcomes();
        state
            .report_failure("first".to_string(), RetryMode::Full, Some(5))
            .unwrap();
        let snapshot = state
            .report_failure("second".to_string(), RetryMode::Quick, Some(2))
            .unwrap();
        assert_eq!(snapshot.failure_id, 2);
        assert_eq!(snapshot.error_message.as_deref(), Some("second"));

        // Only the second cycle ever reports an outcome
        let record = outcomes.recv().await.unwrap();
        assert_eq!(record.failure_id, 2);
        assert_eq!(record.outcome, Outcome::Retry(RetryMode::Quick));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(outcomes.try_recv().is_err());
    }

    #[tokio::test]
    async fn commands_without_cycle_are_no_ops() {
        let state = state();
        assert!(!state.request_retry_now().await.unwrap());
        assert!(!state.request_cancel().await.unwrap());
        assert_eq!(state.get_last_outcome().unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_after_retry_resolved_is_not_accepted() {
        let state = state();
        let mut outcomes = state.subscribe_outcomes();

        for round in 1..=100u64 {
            state
                .report_failure("x".to_string(), RetryMode::Quick, Some(1))
                .unwrap();
            let retried = state.request_retry_now().await.unwrap();

            let record = outcomes.recv().await.unwrap();
            assert_eq!(record.failure_id, round);
            assert_eq!(record.outcome, Outcome::Retry(RetryMode::Quick));

            assert!(
                !state.request_cancel().await.unwrap(),
                "round {}: cancel accepted after the cycle resolved (retry accepted: {})",
                round,
                retried
            );
        }
    }

    #[test]
    fn uptime_is_formatted_in_seconds_when_fresh() {
        assert!(state().get_uptime().ends_with('s'));
    }
}
