//! Local Persistent Store
//!
//! Key/value string storage that survives across sessions on one device,
//! plus the player record (best score, display name) kept in it.

pub mod file;
pub mod memory;

use thiserror::Error;
use tracing::warn;

use crate::config::GameConfig;

pub use file::JsonFileStore;
pub use memory::{MemoryStore, UnavailableStore};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage is disabled or missing.
    #[error("local storage unavailable")]
    Unavailable,

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not valid JSON.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key/value string store.
pub trait LocalStore {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: LocalStore + ?Sized> LocalStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Player data kept in the local store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Name shown on the leaderboard.
    pub display_name: Option<String>,
    /// Highest score recorded on this device.
    pub best_score: u32,
}

impl PlayerRecord {
    /// Read the record. A missing or unreadable best score counts as 0.
    pub fn load<S: LocalStore + ?Sized>(store: &S, config: &GameConfig) -> Result<Self, StoreError> {
        Ok(Self {
            display_name: store
                .get(&config.display_name_key)?
                .filter(|name| !name.trim().is_empty()),
            best_score: read_best(store, &config.best_score_key)?,
        })
    }
}

/// Parse the stored best score. Garbage reads as 0.
pub fn read_best<S: LocalStore + ?Sized>(store: &S, key: &str) -> Result<u32, StoreError> {
    let Some(raw) = store.get(key)? else { return Ok(0) };
    match raw.trim().parse::<u32>() {
        Ok(score) => Ok(score),
        Err(_) => {
            warn!("Ignoring unparsable best score {:?} under {}", raw, key);
            Ok(0)
        }
    }
}

/// Store `candidate` as the best score only if it beats the stored one.
///
/// Returns the best score after the call.
pub fn raise_best<S: LocalStore + ?Sized>(
    store: &mut S,
    key: &str,
    candidate: u32,
) -> Result<u32, StoreError> {
    let current = read_best(store, key)?;
    if candidate > current {
        store.set(key, &candidate.to_string())?;
        Ok(candidate)
    } else {
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "best";

    #[test]
    fn test_raise_best_only_upward() {
        let mut store = MemoryStore::new();
        assert_eq!(raise_best(&mut store, KEY, 5).unwrap(), 5);
        assert_eq!(raise_best(&mut store, KEY, 3).unwrap(), 5);
        assert_eq!(raise_best(&mut store, KEY, 5).unwrap(), 5);
        assert_eq!(raise_best(&mut store, KEY, 12).unwrap(), 12);
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("12"));
    }

    #[test]
    fn test_garbage_reads_as_zero() {
        let mut store = MemoryStore::new();
        store.set(KEY, "not a number").unwrap();
        assert_eq!(read_best(&store, KEY).unwrap(), 0);
        assert_eq!(raise_best(&mut store, KEY, 1).unwrap(), 1);
    }

    #[test]
    fn test_player_record_load() {
        let config = GameConfig::default();
        let mut store = MemoryStore::new();
        assert_eq!(PlayerRecord::load(&store, &config).unwrap(), PlayerRecord::default());

        store.set(&config.display_name_key, "Mika").unwrap();
        store.set(&config.best_score_key, "17").unwrap();
        let record = PlayerRecord::load(&store, &config).unwrap();
        assert_eq!(record.display_name.as_deref(), Some("Mika"));
        assert_eq!(record.best_score, 17);
    }

    #[test]
    fn test_unavailable_store_propagates() {
        let config = GameConfig::default();
        let store = UnavailableStore;
        assert!(matches!(PlayerRecord::load(&store, &config), Err(StoreError::Unavailable)));
    }
}
