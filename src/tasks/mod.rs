//! Background tasks module
//!
//! The countdown tick source and the task that consumes reconnect outcomes.

pub mod connection_manager;
pub mod countdown_timer;

// Re-export main types
pub use connection_manager::{connection_manager_task, ReconnectAction};
pub use countdown_timer::{CountdownTimer, Tick, TickSource, TICK_PERIOD};
