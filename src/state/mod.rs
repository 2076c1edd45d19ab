//! State management module
//!
//! This module contains the timer model, the persisted store, commands,
//! notifications and the shared application state.

pub mod app_state;
pub mod command;
pub mod notification;
pub mod store;
pub mod timer;

// Re-export main types
pub use app_state::{AppState, TimerCounts};
pub use command::Command;
pub use notification::Notification;
pub use store::{Applied, CategoryGroup, SharedStore, TimerStore};
pub use timer::{HistoryEntry, NewTimerInput, Tick, Timer, TimerId, TimerStatus};
