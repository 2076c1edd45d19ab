//! Background tasks module
//!
//! This module contains the per-timer countdown tasks and the notification
//! logger that run alongside the HTTP server.

pub mod notification_log;
pub mod timer_clock;

// Re-export main items
pub use notification_log::notification_log_task;
pub use timer_clock::{TickOutcome, TimerClock, TICK_INTERVAL};
