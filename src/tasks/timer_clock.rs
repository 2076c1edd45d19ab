//! Per-timer countdown tasks
//!
//! Every Running timer owns exactly one ticker task, keyed by timer id.
//! Tickers re-read the timer from the store on each tick, so a tick that
//! fires after a pause or reset sees the new status and stops instead of
//! resurrecting the countdown.
//!
//! Lock order is always store, then tickers. Each spawned ticker carries a
//! generation number, and a tick from a ticker that is no longer the
//! registered one for its timer is dropped without touching the store.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{sync::broadcast, task::JoinHandle, time};
use tracing::{debug, error, info, warn};

use crate::{
    error::{PersistenceError, Result, TrackerError},
    state::{Notification, SharedStore, Tick, Timer, TimerStatus},
};

/// Default cadence of a running countdown
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What a single tick did to a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running and is unchanged
    Idle(Timer),
    /// Remaining went down by one
    Advanced(Timer),
    /// Remaining hit zero and the timer was completed
    Completed(Timer),
}

/// A spawned countdown task and the generation it was registered under
#[derive(Debug)]
struct Ticker {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Drives running timers and applies their lifecycle commands
#[derive(Debug, Clone)]
pub struct TimerClock {
    store: SharedStore,
    notifications: broadcast::Sender<Notification>,
    tickers: Arc<Mutex<HashMap<String, Ticker>>>,
    next_generation: Arc<AtomicU64>,
    tick_interval: Duration,
}

impl TimerClock {
    pub fn new(
        store: SharedStore,
        notifications: broadcast::Sender<Notification>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            store,
            notifications,
            tickers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
            tick_interval,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Paused -> Running, and begin ticking
    pub fn start(&self, id: &str) -> Result<Timer> {
        let mut store = self.store.lock()?;
        let timer = store
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

        let Some(running) = timer.started() else {
            debug!("Start ignored for timer {} in status {:?}", id, timer.status);
            return Ok(timer);
        };

        let applied = store.update(running.clone())?;
        self.spawn_ticker(id)?;
        drop(store);

        info!("Timer '{}' started with {}s remaining", running.name, running.remaining);
        self.report_persistence(applied.persisted);
        Ok(running)
    }

    /// Running -> Paused, cancelling the pending tick
    pub fn pause(&self, id: &str) -> Result<Timer> {
        let mut store = self.store.lock()?;
        let timer = store
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

        let Some(paused) = timer.paused() else {
            debug!("Pause ignored for timer {} in status {:?}", id, timer.status);
            return Ok(timer);
        };

        self.cancel_ticker(id)?;
        let applied = store.update(paused.clone())?;
        drop(store);

        info!("Timer '{}' paused with {}s remaining", paused.name, paused.remaining);
        self.report_persistence(applied.persisted);
        Ok(paused)
    }

    /// Any status -> Paused with a full countdown. Reopens completed timers;
    /// their history entries stay.
    pub fn reset(&self, id: &str) -> Result<Timer> {
        let mut store = self.store.lock()?;
        let timer = store
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

        if timer.is_completed() {
            info!("Reopening completed timer '{}'", timer.name);
        }

        let reset = timer.reset();
        self.cancel_ticker(id)?;
        let applied = store.update(reset.clone())?;
        drop(store);

        self.report_persistence(applied.persisted);
        Ok(reset)
    }

    /// Apply one countdown step to the current stored value of the timer
    pub fn tick(&self, id: &str) -> Result<TickOutcome> {
        self.apply_tick(id, None)
    }

    /// Tick on behalf of the ticker registered under `generation`. A ticker
    /// that has since been cancelled or replaced gets `Idle` back.
    fn tick_from_ticker(&self, id: &str, generation: u64) -> Result<TickOutcome> {
        self.apply_tick(id, Some(generation))
    }

    fn apply_tick(&self, id: &str, generation: Option<u64>) -> Result<TickOutcome> {
        let (outcome, notification, persisted) = {
            let mut store = self.store.lock()?;
            let timer = store
                .get(id)
                .cloned()
                .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

            if let Some(generation) = generation {
                if self.ticker_generation(id)? != Some(generation) {
                    debug!("Dropping tick from stale ticker {} for timer {}", generation, id);
                    return Ok(TickOutcome::Idle(timer));
                }
            }

            match timer.tick() {
                Tick::Ignored => (TickOutcome::Idle(timer), None, Ok(())),
                Tick::Advanced { next, halfway } => {
                    let applied = store.update(next.clone())?;
                    let notification = halfway.then(|| Notification::Halfway {
                        timer_id: next.id.clone(),
                        name: next.name.clone(),
                    });
                    (TickOutcome::Advanced(next), notification, applied.persisted)
                }
                Tick::Finished => {
                    let applied = store.complete(id)?;
                    let done = timer.completed();
                    let notification = Notification::Completed {
                        timer_id: done.id.clone(),
                        name: done.name.clone(),
                        completed_at: applied.value.completed_at.clone(),
                    };
                    (TickOutcome::Completed(done), Some(notification), applied.persisted)
                }
            }
        };

        self.report_persistence(persisted);
        if let Some(notification) = notification {
            self.notify(notification);
        }
        Ok(outcome)
    }

    /// Complete a timer immediately, whatever is left on it
    pub fn complete(&self, id: &str) -> Result<Timer> {
        let (done, notification, persisted) = {
            let mut store = self.store.lock()?;
            self.cancel_ticker(id)?;
            let applied = store.complete(id)?;
            let done = store
                .get(id)
                .cloned()
                .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
            let notification = Notification::Completed {
                timer_id: done.id.clone(),
                name: done.name.clone(),
                completed_at: applied.value.completed_at.clone(),
            };
            (done, notification, applied.persisted)
        };

        self.report_persistence(persisted);
        self.notify(notification);
        Ok(done)
    }

    /// Spawn tickers for timers that were persisted while running
    pub fn resume_running(&self) -> Result<usize> {
        let store = self.store.lock()?;
        let ids = store.ids_with_status(TimerStatus::Running);
        for id in &ids {
            self.spawn_ticker(id)?;
        }
        drop(store);

        if !ids.is_empty() {
            info!("Resumed {} running timers", ids.len());
        }
        Ok(ids.len())
    }

    /// Whether a live ticker exists for `id`
    pub fn is_ticking(&self, id: &str) -> bool {
        self.tickers
            .lock()
            .map(|tickers| tickers.get(id).is_some_and(|t| !t.handle.is_finished()))
            .unwrap_or(false)
    }

    /// Number of live tickers
    pub fn active_tickers(&self) -> usize {
        self.tickers
            .lock()
            .map(|tickers| tickers.values().filter(|t| !t.handle.is_finished()).count())
            .unwrap_or(0)
    }

    /// Cancel every ticker, for teardown
    pub fn shutdown(&self) {
        match self.tickers.lock() {
            Ok(mut tickers) => {
                let count = tickers.len();
                for (_, ticker) in tickers.drain() {
                    ticker.handle.abort();
                }
                info!("Cancelled {} timer tickers", count);
            }
            Err(e) => error!("Failed to lock tickers during shutdown: {}", e),
        }
    }

    /// Replace any ticker for `id` with a fresh one. Caller holds the store lock.
    fn spawn_ticker(&self, id: &str) -> Result<()> {
        let clock = self.clone();
        let timer_id = id.to_string();
        let period = self.tick_interval;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                match clock.tick_from_ticker(&timer_id, generation) {
                    Ok(TickOutcome::Advanced(timer)) => {
                        debug!("Timer {} tick: {}s remaining", timer.id, timer.remaining);
                    }
                    Ok(TickOutcome::Completed(timer)) => {
                        debug!("Ticker for timer {} finished", timer.id);
                        break;
                    }
                    Ok(TickOutcome::Idle(timer)) => {
                        debug!(
                            "Ticker for timer {} stopping, status is {:?}",
                            timer.id, timer.status
                        );
                        break;
                    }
                    Err(e) => {
                        error!("Ticker for timer {} failed: {}", timer_id, e);
                        break;
                    }
                }
            }
        });

        let mut tickers = self.tickers.lock()?;
        if let Some(previous) = tickers.insert(id.to_string(), Ticker { generation, handle }) {
            previous.handle.abort();
        }
        Ok(())
    }

    /// Abort the ticker for `id`, if any. Caller holds the store lock.
    fn cancel_ticker(&self, id: &str) -> Result<()> {
        let mut tickers = self.tickers.lock()?;
        if let Some(ticker) = tickers.remove(id) {
            ticker.handle.abort();
            debug!("Cancelled ticker for timer {}", id);
        }
        Ok(())
    }

    /// Generation of the ticker currently registered for `id`
    fn ticker_generation(&self, id: &str) -> Result<Option<u64>> {
        let tickers = self.tickers.lock()?;
        Ok(tickers.get(id).map(|t| t.generation))
    }

    fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifications.send(notification) {
            debug!("No notification listeners: {}", e);
        }
    }

    fn report_persistence(&self, persisted: std::result::Result<(), PersistenceError>) {
        if let Err(e) = persisted {
            warn!("State change applied but not persisted: {}", e);
            self.notify(Notification::PersistenceWarning {
                message: e.to_string(),
            });
        }
    }
}
