//! Reconnect Coordinator - countdown-driven reconnect decisions
//!
//! When a secure tunnel drops, a coordinator counts down before retrying,
//! lets the user retry early or cancel, and hands exactly one outcome
//! (quick resume, full renegotiation, or abandon) to the session owner.
//! A small HTTP control server exposes the same flow.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use coordinator::{
    spawn_coordinator, ChannelListener, CoordinatorEvent, CoordinatorHandle, FailureReport,
    ReconnectCoordinator, ReconnectListener,
};
pub use error::{CoordinatorError, Result};
pub use state::{AppState, Outcome, RetryMode};
pub use utils::signals::shutdown_signal;
