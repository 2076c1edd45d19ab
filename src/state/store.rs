//! Authoritative timer collection and completion history
//!
//! Every accepted mutation rewrites the affected collection in full. A
//! failed write does not roll memory back: the change stays applied and the
//! caller gets the persistence error alongside the value in [`Applied`].
//! The next successful write of the same collection heals the divergence.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::timer::{HistoryEntry, NewTimerInput, Timer, TimerId, TimerStatus};
use crate::{
    error::{PersistenceError, Result, TrackerError},
    storage::{Storage, HISTORY_KEY, TIMERS_KEY},
};

/// Store shared between the command surface and the clock
pub type SharedStore = Arc<Mutex<TimerStore>>;

/// A mutation that took effect in memory, with the outcome of persisting it
#[derive(Debug)]
#[must_use]
pub struct Applied<T> {
    pub value: T,
    pub persisted: std::result::Result<(), PersistenceError>,
}

impl<T> Applied<T> {
    fn new(value: T, persisted: std::result::Result<(), PersistenceError>) -> Self {
        Self { value, persisted }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }

    /// Treat a failed write as an error, dropping the value
    pub fn into_result(self) -> Result<T> {
        self.persisted?;
        Ok(self.value)
    }
}

/// Timers that share a category, in first-appearance order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub timers: Vec<Timer>,
}

/// In-memory snapshot of all timers and history, backed by durable storage
pub struct TimerStore {
    timers: Vec<Timer>,
    history: Vec<HistoryEntry>,
    storage: Box<dyn Storage>,
}

impl std::fmt::Debug for TimerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerStore")
            .field("timers", &self.timers)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl TimerStore {
    /// Load timers and history from `storage`; absent records start empty
    pub fn load(storage: impl Storage + 'static) -> Result<Self> {
        let timers: Vec<Timer> = read_collection(&storage, TIMERS_KEY)?;
        let history: Vec<HistoryEntry> = read_collection(&storage, HISTORY_KEY)?;

        info!(
            "Loaded {} timers and {} history entries",
            timers.len(),
            history.len()
        );

        Ok(Self {
            timers,
            history,
            storage: Box::new(storage),
        })
    }

    /// Wrap the store for sharing across tasks
    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn get(&self, id: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn ids_with_status(&self, status: TimerStatus) -> Vec<TimerId> {
        self.timers
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Timers grouped by category; groups and members keep insertion order
    pub fn grouped_by_category(&self) -> Vec<CategoryGroup> {
        let mut groups: Vec<CategoryGroup> = Vec::new();
        for timer in &self.timers {
            match groups.iter_mut().find(|g| g.category == timer.category) {
                Some(group) => group.timers.push(timer.clone()),
                None => groups.push(CategoryGroup {
                    category: timer.category.clone(),
                    timers: vec![timer.clone()],
                }),
            }
        }
        groups
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create a paused timer with a full countdown and persist the collection
    pub fn add(&mut self, input: NewTimerInput) -> Result<Applied<Timer>> {
        let timer = Timer::new(input);
        info!(
            "Adding timer '{}' ({}s, category '{}')",
            timer.name, timer.duration, timer.category
        );
        self.timers.push(timer.clone());
        Ok(Applied::new(timer, self.persist_timers()))
    }

    /// Replace the stored timer with the same id. Status transitions are the
    /// caller's responsibility; the value is stored as given.
    pub fn update(&mut self, timer: Timer) -> Result<Applied<()>> {
        let slot = self
            .timers
            .iter_mut()
            .find(|t| t.id == timer.id)
            .ok_or_else(|| TrackerError::NotFound(timer.id.clone()))?;

        debug!(
            "Updating timer {}: status={:?} remaining={}",
            timer.id, timer.status, timer.remaining
        );
        *slot = timer;
        Ok(Applied::new((), self.persist_timers()))
    }

    /// Append a history entry and mark the timer completed, as one step.
    ///
    /// Both collections are written; the first write failure is reported.
    pub fn complete(&mut self, id: &str) -> Result<Applied<HistoryEntry>> {
        let timer = self
            .get(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        if timer.is_completed() {
            return Err(TrackerError::AlreadyCompleted(id.to_string()));
        }

        let entry = HistoryEntry::now(timer);
        let completed = timer.completed();
        info!("Timer '{}' completed at {}", entry.name, entry.completed_at);

        self.history.push(entry.clone());
        let history_written = self.persist_history();

        let timers_written = self.update(completed)?.persisted;

        Ok(Applied::new(entry, history_written.and(timers_written)))
    }

    fn persist_timers(&mut self) -> std::result::Result<(), PersistenceError> {
        write_collection(self.storage.as_mut(), TIMERS_KEY, &self.timers)
            .inspect_err(|e| debug!("Timers not persisted: {}", e))
    }

    fn persist_history(&mut self) -> std::result::Result<(), PersistenceError> {
        write_collection(self.storage.as_mut(), HISTORY_KEY, &self.history)
            .inspect_err(|e| debug!("History not persisted: {}", e))
    }
}

fn read_collection<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> std::result::Result<Vec<T>, PersistenceError> {
    match storage.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| PersistenceError::Decode {
            key: key.to_string(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

fn write_collection<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    items: &[T],
) -> std::result::Result<(), PersistenceError> {
    let raw = serde_json::to_string(items).map_err(|source| PersistenceError::Encode {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &raw)
}
