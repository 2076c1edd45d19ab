//! Timer model and its lifecycle transitions
//!
//! Transitions are pure: each returns the next value of a timer and leaves
//! persistence to the store. Completed is terminal for start, pause and
//! tick; only reset reopens it.
//!
//! ```text
//! Paused --start--> Running --pause--> Paused
//! Running --tick(remaining hits 0)--> Completed
//! any --reset--> Paused (remaining = duration)
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Opaque unique timer identifier
pub type TimerId = String;

/// Lifecycle status of a timer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimerStatus {
    Paused,
    Running,
    Completed,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Paused
    }
}

/// One named, categorized countdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    pub name: String,
    pub category: String,
    /// Total seconds, fixed at creation
    pub duration: u64,
    /// Seconds left, always within `0..=duration`
    pub remaining: u64,
    #[serde(default)]
    pub status: TimerStatus,
    #[serde(default)]
    pub halfway_alert_shown: bool,
}

/// Result of applying one tick to a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// The timer is not running; nothing changes
    Ignored,
    /// Remaining went down by one and the timer keeps running
    Advanced { next: Timer, halfway: bool },
    /// Remaining reached zero; the timer must be completed
    Finished,
}

impl Timer {
    /// Create a fresh paused timer from validated input
    pub fn new(input: NewTimerInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            category: input.category,
            duration: input.duration,
            remaining: input.duration,
            status: TimerStatus::Paused,
            halfway_alert_shown: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_completed(&self) -> bool {
        self.status == TimerStatus::Completed
    }

    /// Paused -> Running. `None` when the transition does not apply.
    pub fn started(&self) -> Option<Timer> {
        if self.status != TimerStatus::Paused || self.remaining == 0 {
            return None;
        }
        Some(Timer {
            status: TimerStatus::Running,
            ..self.clone()
        })
    }

    /// Running -> Paused, keeping the current remaining value
    pub fn paused(&self) -> Option<Timer> {
        if self.status != TimerStatus::Running {
            return None;
        }
        Some(Timer {
            status: TimerStatus::Paused,
            ..self.clone()
        })
    }

    /// Any status -> Paused with a full countdown and the halfway flag cleared
    pub fn reset(&self) -> Timer {
        Timer {
            remaining: self.duration,
            status: TimerStatus::Paused,
            halfway_alert_shown: false,
            ..self.clone()
        }
    }

    /// Terminal form written by the store on completion
    pub fn completed(&self) -> Timer {
        Timer {
            remaining: 0,
            status: TimerStatus::Completed,
            ..self.clone()
        }
    }

    /// Advance a running timer by one second.
    ///
    /// Completion wins over the halfway check: a tick that reaches zero
    /// never reports halfway, so a one-second timer completes without it.
    pub fn tick(&self) -> Tick {
        if self.status != TimerStatus::Running {
            return Tick::Ignored;
        }

        let remaining = self.remaining.saturating_sub(1);
        if remaining == 0 {
            return Tick::Finished;
        }

        // remaining <= duration / 2, compared without truncation
        let halfway = !self.halfway_alert_shown && remaining * 2 <= self.duration;
        Tick::Advanced {
            next: Timer {
                remaining,
                halfway_alert_shown: self.halfway_alert_shown || halfway,
                ..self.clone()
            },
            halfway,
        }
    }

    /// Fraction of the countdown already elapsed, `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        1.0 - (self.remaining as f64 / self.duration as f64)
    }
}

/// Validated input for creating a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimerInput {
    pub name: String,
    pub category: String,
    pub duration: u64,
}

impl NewTimerInput {
    /// Validate already-typed fields
    pub fn new(
        name: impl Into<String>,
        duration: i64,
        category: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        let category = category.into().trim().to_string();
        if name.is_empty() || category.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if duration <= 0 {
            return Err(ValidationError::InvalidDuration(duration.to_string()));
        }
        Ok(Self {
            name,
            category,
            duration: duration as u64,
        })
    }

    /// Validate raw form fields, with the duration still as text
    pub fn parse(name: &str, duration: &str, category: &str) -> Result<Self, ValidationError> {
        let duration_text = duration.trim();
        if name.trim().is_empty() || category.trim().is_empty() || duration_text.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        let seconds = duration_text
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidDuration(duration_text.to_string()))?;
        Self::new(name, seconds, category)
    }
}

/// Immutable record of a completed timer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub name: String,
    /// Local wall-clock time of completion, human readable
    pub completed_at: String,
}

impl HistoryEntry {
    /// Record `timer` as completed now
    pub fn now(timer: &Timer) -> Self {
        Self {
            name: timer.name.clone(),
            completed_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(duration: i64) -> Timer {
        Timer::new(NewTimerInput::new("Tea", duration, "Kitchen").unwrap())
    }

    fn run_ticks(mut timer: Timer, ticks: usize) -> (Timer, usize) {
        let mut halfway_count = 0;
        for _ in 0..ticks {
            match timer.tick() {
                Tick::Advanced { next, halfway } => {
                    if halfway {
                        halfway_count += 1;
                    }
                    timer = next;
                }
                Tick::Finished => {
                    timer = timer.completed();
                }
                Tick::Ignored => {}
            }
        }
        (timer, halfway_count)
    }

    #[test]
    fn new_timer_starts_paused_and_full() {
        let t = timer(10);
        assert_eq!(t.duration, 10);
        assert_eq!(t.remaining, 10);
        assert_eq!(t.status, TimerStatus::Paused);
        assert!(!t.halfway_alert_shown);
        assert!(!t.id.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(timer(5).id, timer(5).id);
    }

    #[test]
    fn start_and_pause() {
        let t = timer(10);
        assert!(t.paused().is_none());

        let running = t.started().unwrap();
        assert!(running.is_running());
        assert!(running.started().is_none());

        let paused = running.paused().unwrap();
        assert_eq!(paused.status, TimerStatus::Paused);
        assert_eq!(paused.remaining, 10);
    }

    #[test]
    fn halfway_fires_once_at_half() {
        let running = timer(10).started().unwrap();
        let (t, halfway) = run_ticks(running, 5);
        assert_eq!(t.remaining, 5);
        assert!(t.halfway_alert_shown);
        assert_eq!(halfway, 1);

        let (t, halfway) = run_ticks(t, 3);
        assert_eq!(t.remaining, 2);
        assert_eq!(halfway, 0);
    }

    #[test]
    fn odd_duration_halfway_uses_exact_half() {
        let running = timer(5).started().unwrap();
        // 3 > 2.5, 2 <= 2.5
        let (t, halfway) = run_ticks(running, 2);
        assert_eq!(t.remaining, 3);
        assert_eq!(halfway, 0);
        let (t, halfway) = run_ticks(t, 1);
        assert_eq!(t.remaining, 2);
        assert_eq!(halfway, 1);
    }

    #[test]
    fn full_run_completes() {
        let running = timer(10).started().unwrap();
        let (t, halfway) = run_ticks(running, 10);
        assert_eq!(t.remaining, 0);
        assert_eq!(t.status, TimerStatus::Completed);
        assert_eq!(halfway, 1);
    }

    #[test]
    fn one_second_timer_skips_halfway() {
        let running = timer(1).started().unwrap();
        assert_eq!(running.tick(), Tick::Finished);
        let (t, halfway) = run_ticks(running, 1);
        assert!(t.is_completed());
        assert!(!t.halfway_alert_shown);
        assert_eq!(halfway, 0);
    }

    #[test]
    fn completed_is_terminal() {
        let done = timer(3).completed();
        assert_eq!(done.tick(), Tick::Ignored);
        assert!(done.started().is_none());
        assert!(done.paused().is_none());
    }

    #[test]
    fn paused_timer_ignores_ticks() {
        assert_eq!(timer(3).tick(), Tick::Ignored);
    }

    #[test]
    fn reset_is_idempotent() {
        let (t, _) = run_ticks(timer(10).started().unwrap(), 6);
        let once = t.reset();
        assert_eq!(once.remaining, 10);
        assert_eq!(once.status, TimerStatus::Paused);
        assert!(!once.halfway_alert_shown);
        assert_eq!(once.reset(), once);
    }

    #[test]
    fn reset_reopens_completed_timer() {
        let reopened = timer(4).completed().reset();
        assert_eq!(reopened.status, TimerStatus::Paused);
        assert_eq!(reopened.remaining, 4);
        assert!(reopened.started().is_some());
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            NewTimerInput::parse("", "10", "X"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            NewTimerInput::parse("Tea", "", "X"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            NewTimerInput::parse("Tea", "10", "  "),
            Err(ValidationError::MissingFields)
        );
        assert!(matches!(
            NewTimerInput::parse("Tea", "ten", "X"),
            Err(ValidationError::InvalidDuration(_))
        ));
        assert!(matches!(
            NewTimerInput::parse("Tea", "0", "X"),
            Err(ValidationError::InvalidDuration(_))
        ));
        assert!(matches!(
            NewTimerInput::parse("Tea", "-4", "X"),
            Err(ValidationError::InvalidDuration(_))
        ));
    }

    #[test]
    fn parse_trims_fields() {
        let input = NewTimerInput::parse(" Tea ", " 90 ", " Kitchen").unwrap();
        assert_eq!(input.name, "Tea");
        assert_eq!(input.category, "Kitchen");
        assert_eq!(input.duration, 90);
    }

    #[test]
    fn serializes_camel_case() {
        let t = timer(10);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["halfwayAlertShown"], false);
        assert_eq!(json["status"], "Paused");
        assert_eq!(json["remaining"], 10);

        let entry = HistoryEntry::now(&t);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["name"], "Tea");
        assert!(json["completedAt"].is_string());
    }

    #[test]
    fn progress_tracks_remaining() {
        let mut t = timer(4);
        assert_eq!(t.progress(), 0.0);
        t.remaining = 1;
        assert_eq!(t.progress(), 0.75);
    }
}
