//! Volatile store for embedding and tests.

use crate::store::entry_store::{EntryStore, StoreError, StoreLoad, StoreResult};
use crate::store::state::StoreState;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

const MEMORY_PATH: &str = ":memory:";

/// Keeps the last saved state in process memory.
///
/// `fail_writes(true)` makes every following `save` fail with an I/O error,
/// which lets callers exercise rollback paths without touching the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<StoreState>>,
    save_count: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `state`, as if saved earlier.
    pub fn with_state(state: StoreState) -> Self {
        Self {
            saved: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Last successfully saved state, if any.
    pub fn saved_state(&self) -> Option<StoreState> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EntryStore for MemoryStore {
    fn load(&self) -> StoreResult<StoreLoad> {
        Ok(match self.saved_state() {
            Some(state) => StoreLoad::Current(state),
            None => StoreLoad::Missing,
        })
    }

    fn save(&self, state: &StoreState) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: PathBuf::from(MEMORY_PATH),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "memory store writes disabled",
                ),
            });
        }
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
