//! State management module
//!
//! Countdown state owned by each coordinator, and the shared state the
//! control server publishes.

pub mod app_state;
pub mod countdown_state;

// Re-export main types
pub use app_state::{AppState, OutcomeRecord};
pub use countdown_state::{CountdownSnapshot, CountdownState, Outcome, Phase, RetryMode};
