//! User-facing notifications produced by commands and the clock

use serde::Serialize;

use super::TimerId;

/// Event pushed toward whatever is rendering the timers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    /// A running timer crossed half of its duration
    #[serde(rename_all = "camelCase")]
    Halfway { timer_id: TimerId, name: String },
    /// A timer reached zero and was recorded in history
    #[serde(rename_all = "camelCase")]
    Completed {
        timer_id: TimerId,
        name: String,
        completed_at: String,
    },
    /// New-timer input was rejected
    ValidationFailed { message: String },
    /// A change was applied but could not be written to storage
    PersistenceWarning { message: String },
}

impl Notification {
    /// Short title as a UI would show it
    pub fn title(&self) -> String {
        match self {
            Notification::Halfway { name, .. } => format!("Halfway there! {} is halfway done.", name),
            Notification::Completed { name, .. } => format!("{} completed!", name),
            Notification::ValidationFailed { message } => message.clone(),
            Notification::PersistenceWarning { message } => {
                format!("Changes not saved: {}", message)
            }
        }
    }
}
