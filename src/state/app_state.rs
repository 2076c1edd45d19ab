//! Main application state: store, clock and the command surface

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{
    CategoryGroup, Command, HistoryEntry, NewTimerInput, Notification, SharedStore, Timer,
    TimerStatus, TimerStore,
};
use crate::{
    error::{Result, TrackerError},
    tasks::{TickOutcome, TimerClock},
};

/// Per-status timer counts for the status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerCounts {
    pub paused: usize,
    pub running: usize,
    pub completed: usize,
}

/// Shared application state handed to the API and background tasks
#[derive(Debug)]
pub struct AppState {
    store: SharedStore,
    clock: TimerClock,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Channel for halfway, completion and warning notifications
    pub notification_tx: broadcast::Sender<Notification>,
}

impl AppState {
    /// Create the state around a loaded store
    pub fn new(store: TimerStore, port: u16, host: String, tick_interval: Duration) -> Self {
        let (notification_tx, _) = broadcast::channel(100);
        let store = store.shared();
        let clock = TimerClock::new(Arc::clone(&store), notification_tx.clone(), tick_interval);

        Self {
            store,
            clock,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            notification_tx,
        }
    }

    pub fn clock(&self) -> &TimerClock {
        &self.clock
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notification_tx.subscribe()
    }

    /// Apply a command and return the affected timer's new state
    pub fn dispatch(&self, command: Command) -> Result<Timer> {
        let action = command.action();
        let result = match command {
            Command::AddTimer {
                name,
                duration,
                category,
            } => self.add_timer(&name, &duration, &category),
            Command::StartTimer(id) => self.clock.start(&id),
            Command::PauseTimer(id) => self.clock.pause(&id),
            Command::ResetTimer(id) => self.clock.reset(&id),
            Command::TickTimer(id) => self.clock.tick(&id).map(|outcome| match outcome {
                TickOutcome::Idle(t) | TickOutcome::Advanced(t) | TickOutcome::Completed(t) => t,
            }),
            Command::CompleteTimer(id) => self.clock.complete(&id),
        };

        match &result {
            Ok(_) => self.record_action(action),
            Err(TrackerError::NotFound(id)) => {
                warn!("Command '{}' referenced unknown timer {}", action, id)
            }
            Err(e) => warn!("Command '{}' failed: {}", action, e),
        }
        result
    }

    /// Validate form input and create a timer
    fn add_timer(&self, name: &str, duration: &str, category: &str) -> Result<Timer> {
        let input = match NewTimerInput::parse(name, duration, category) {
            Ok(input) => input,
            Err(e) => {
                self.notify(Notification::ValidationFailed {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let applied = self.store.lock()?.add(input)?;
        if let Err(e) = &applied.persisted {
            warn!("Timer added but not persisted: {}", e);
            self.notify(Notification::PersistenceWarning {
                message: e.to_string(),
            });
        }
        Ok(applied.value)
    }

    /// Start ticking every timer that was persisted as running
    pub fn resume_running(&self) -> Result<usize> {
        self.clock.resume_running()
    }

    /// Cancel all tickers
    pub fn shutdown(&self) {
        self.clock.shutdown();
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get_timer(&self, id: &str) -> Result<Timer> {
        self.store
            .lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    pub fn get_timers_grouped_by_category(&self) -> Result<Vec<CategoryGroup>> {
        Ok(self.store.lock()?.grouped_by_category())
    }

    pub fn get_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.store.lock()?.history().to_vec())
    }

    pub fn get_counts(&self) -> Result<TimerCounts> {
        let store = self.store.lock()?;
        let mut counts = TimerCounts::default();
        for timer in store.timers() {
            match timer.status {
                TimerStatus::Paused => counts.paused += 1,
                TimerStatus::Running => counts.running += 1,
                TimerStatus::Completed => counts.completed += 1,
            }
        }
        Ok(counts)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn record_action(&self, action: &str) {
        if action == "tick" {
            return;
        }
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
        info!("Action '{}' applied", action);
    }

    fn notify(&self, notification: Notification) {
        if let Err(e) = self.notification_tx.send(notification) {
            tracing::debug!("No notification listeners: {}", e);
        }
    }
}
