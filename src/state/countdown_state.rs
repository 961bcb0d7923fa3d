//! Countdown state structure and management

use serde::{Deserialize, Serialize};

/// Kind of reconnection the eventual retry asks the connection manager for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    /// Resume the existing session without renegotiation
    Quick,
    /// Renegotiate the session from scratch
    Full,
}

impl RetryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryMode::Quick => "quick",
            RetryMode::Full => "full",
        }
    }
}

impl std::fmt::Display for RetryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    CountingDown,
    Resolved,
}

/// The single terminal decision a coordinator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "mode", rename_all = "lowercase")]
pub enum Outcome {
    Retry(RetryMode),
    Cancel,
}

/// State owned by a single reconnect coordinator
#[derive(Debug, Clone)]
pub struct CountdownState {
    pub remaining_seconds: u32,
    pub retry_mode: RetryMode,
    pub phase: Phase,
    pub error_message: String,
    pub outcome: Option<Outcome>,
}

impl CountdownState {
    /// Create a state that is counting down from `countdown_seconds`
    pub fn new(error_message: String, retry_mode: RetryMode, countdown_seconds: u32) -> Self {
        Self {
            remaining_seconds: countdown_seconds,
            retry_mode,
            phase: Phase::CountingDown,
            error_message,
            outcome: None,
        }
    }

    pub fn is_counting_down(&self) -> bool {
        self.phase == Phase::CountingDown
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == Phase::Resolved
    }

    /// Decrement the countdown, returning the new remaining value.
    ///
    /// Returns `None` once resolved; a stray tick must not touch the counter.
    pub fn decrement(&mut self) -> Option<u32> {
        if !self.is_counting_down() {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        Some(self.remaining_seconds)
    }

    /// Move to `Resolved` with the given outcome.
    ///
    /// Returns `false` if the state was already resolved; the first outcome wins.
    pub fn resolve(&mut self, outcome: Outcome) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.phase = Phase::Resolved;
        self.outcome = Some(outcome);
        true
    }
}

/// Published view of the current reconnect cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    /// Identifies the failure that started this cycle; 0 before any failure
    pub failure_id: u64,
    pub active: bool,
    pub phase: Option<Phase>,
    pub remaining_seconds: Option<u32>,
    pub retry_mode: Option<RetryMode>,
    pub error_message: Option<String>,
    pub outcome: Option<Outcome>,
}

impl CountdownSnapshot {
    /// Snapshot used before any failure was reported
    pub fn idle() -> Self {
        Self {
            failure_id: 0,
            active: false,
            phase: None,
            remaining_seconds: None,
            retry_mode: None,
            error_message: None,
            outcome: None,
        }
    }

    /// Snapshot of a freshly started cycle
    pub fn counting_down(
        failure_id: u64,
        error_message: String,
        retry_mode: RetryMode,
        remaining_seconds: u32,
    ) -> Self {
        Self {
            failure_id,
            active: true,
            phase: Some(Phase::CountingDown),
            remaining_seconds: Some(remaining_seconds),
            retry_mode: Some(retry_mode),
            error_message: Some(error_message),
            outcome: None,
        }
    }

    /// Text shown next to the retry and cancel buttons
    pub fn countdown_text(&self) -> Option<String> {
        match (self.active, self.remaining_seconds) {
            (true, Some(seconds)) => Some(format!("Will retry in {} seconds...", seconds)),
            _ => None,
        }
    }
}

impl Default for CountdownSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_stops_after_resolution() {
        let mut state = CountdownState::new("link down".to_string(), RetryMode::Quick, 3);
        assert_eq!(state.decrement(), Some(2));
        assert!(state.resolve(Outcome::Cancel));
        assert_eq!(state.decrement(), None);
        assert_eq!(state.remaining_seconds, 2);
    }

    #[test]
    fn first_outcome_wins() {
        let mut state = CountdownState::new("link down".to_string(), RetryMode::Full, 3);
        assert!(state.resolve(Outcome::Retry(RetryMode::Full)));
        assert!(!state.resolve(Outcome::Cancel));
        assert_eq!(state.outcome, Some(Outcome::Retry(RetryMode::Full)));
    }

    #[test]
    fn outcome_serializes_with_mode() {
        let json = serde_json::to_value(Outcome::Retry(RetryMode::Quick)).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "retry", "mode": "quick" }));

        let json = serde_json::to_value(Outcome::Cancel).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "cancel" }));
    }

    #[test]
    fn countdown_text_only_while_active() {
        let snapshot = CountdownSnapshot::counting_down(1, "x".to_string(), RetryMode::Quick, 4);
        assert_eq!(
            snapshot.countdown_text().as_deref(),
            Some("Will retry in 4 seconds...")
        );
        assert_eq!(CountdownSnapshot::idle().countdown_text(), None);
    }
}
