//! Timer Tracker - A state-managed countdown timer tracker
//!
//! This library manages named, categorized countdown timers: a persisted
//! store of timers and completion history, a clock that drives running
//! timers once per tick, and an HTTP surface for commands and queries.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{Result, TrackerError};
pub use state::{AppState, Command, Notification, Timer, TimerStatus, TimerStore};
pub use utils::signals::shutdown_signal;
