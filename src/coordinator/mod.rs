//! Reconnect coordination
//!
//! A coordinator is created for every dropped connection. It counts down,
//! lets the user retry early or cancel, and reports exactly one outcome to
//! whoever owns the network session.

pub mod host;
pub mod listener;
pub mod reconnect;

// Re-export main types
pub use host::{spawn_coordinator, Command, CommandAck, CoordinatorHandle};
pub use listener::{ChannelListener, CoordinatorEvent, ReconnectListener};
pub use reconnect::{FailureReport, ReconnectCoordinator, DEFAULT_COUNTDOWN_SECONDS};
