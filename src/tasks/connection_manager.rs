//! Connection manager stand-in that consumes reconnect outcomes

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::state::{AppState, Outcome, OutcomeRecord, RetryMode};

/// What the session owner does with an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectAction {
    /// Resume the existing session
    Resume,
    /// Tear the session down and negotiate a new one
    Renegotiate,
    /// Stay disconnected
    Abandon,
}

impl From<Outcome> for ReconnectAction {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Retry(RetryMode::Quick) => ReconnectAction::Resume,
            Outcome::Retry(RetryMode::Full) => ReconnectAction::Renegotiate,
            Outcome::Cancel => ReconnectAction::Abandon,
        }
    }
}

fn handle_outcome(record: &OutcomeRecord) -> ReconnectAction {
    let action = ReconnectAction::from(record.outcome);
    match action {
        ReconnectAction::Resume => {
            info!("Cycle {}: resuming session after '{}'", record.failure_id, record.error_message)
        }
        ReconnectAction::Renegotiate => {
            info!("Cycle {}: renegotiating session after '{}'", record.failure_id, record.error_message)
        }
        ReconnectAction::Abandon => {
            info!("Cycle {}: reconnect abandoned, staying offline", record.failure_id)
        }
    }
    action
}

/// Background task that receives every terminal outcome and acts on it
pub async fn connection_manager_task(state: Arc<AppState>) {
    info!("Starting connection manager task");

    let mut outcome_rx = state.subscribe_outcomes();

    loop {
        match outcome_rx.recv().await {
            Ok(record) => {
                handle_outcome(&record);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Connection manager fell behind, {} outcomes skipped", skipped);
            }
            Err(RecvError::Closed) => {
                error!("Outcome channel closed, connection manager exiting");
                break;
            }
        }
    }
}
