//! Durable key-value storage
//!
//! The store keeps two records, `timers` and `history`, each holding a
//! whole JSON array. Every write replaces the full value for its key.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::path::PathBuf;

use crate::error::PersistenceError;

/// Key under which the timer collection is stored
pub const TIMERS_KEY: &str = "timers";
/// Key under which the completion history is stored
pub const HISTORY_KEY: &str = "history";

/// String-valued key-value storage
pub trait Storage: Send {
    /// Read the value for `key`, `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Overwrite the value for `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }
}

/// Default data directory: `<platform data dir>/timer-tracker`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timer-tracker")
}
