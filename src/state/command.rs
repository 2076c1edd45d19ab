//! Commands accepted by the tracker

use std::fmt;

use super::TimerId;

/// Every intent that can change tracker state.
///
/// `TickTimer` and `CompleteTimer` normally originate from the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddTimer {
        name: String,
        duration: String,
        category: String,
    },
    StartTimer(TimerId),
    PauseTimer(TimerId),
    ResetTimer(TimerId),
    TickTimer(TimerId),
    CompleteTimer(TimerId),
}

impl Command {
    /// Action label used for last-action tracking and logs
    pub fn action(&self) -> &'static str {
        match self {
            Command::AddTimer { .. } => "add",
            Command::StartTimer(_) => "start",
            Command::PauseTimer(_) => "pause",
            Command::ResetTimer(_) => "reset",
            Command::TickTimer(_) => "tick",
            Command::CompleteTimer(_) => "complete",
        }
    }

    /// Target timer, if the command addresses an existing one
    pub fn timer_id(&self) -> Option<&str> {
        match self {
            Command::AddTimer { .. } => None,
            Command::StartTimer(id)
            | Command::PauseTimer(id)
            | Command::ResetTimer(id)
            | Command::TickTimer(id)
            | Command::CompleteTimer(id) => Some(id),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timer_id() {
            Some(id) => write!(f, "{} {}", self.action(), id),
            None => write!(f, "{}", self.action()),
        }
    }
}
