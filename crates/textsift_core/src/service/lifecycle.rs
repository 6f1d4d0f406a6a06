//! Entry lifecycle use-case service.
//!
//! # Responsibility
//! - Turn submitted text into classified entries.
//! - Move entries between the active and trash collections.
//! - Flush the full state to the backing store after every mutation.
//!
//! # Invariants
//! - This service is the only writer of the collections.
//! - Mutations run under one write guard that also spans the flush.
//! - A mutation is staged on a copy and becomes visible only after the
//!   flush succeeded; a failed flush leaves the previous state in place.
//! - Permanent deletion is only possible from the trash collection.

use crate::classify::classifier::{classify, classify_batch};
use crate::model::entry::{Entry, EntryId};
use crate::store::entry_store::{EntryStore, StoreError};
use crate::store::state::{StoreState, StoreStats};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{PoisonError, RwLock};
use std::time::Instant;

/// Default upper bound on submitted content length, in characters.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 64 * 1024;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Collection targeted by a lifecycle lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Active,
    Trash,
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Trash => f.write_str("trash"),
        }
    }
}

/// Error for lifecycle operations.
#[derive(Debug)]
pub enum LifecycleError {
    /// The id is not present in the collection the operation reads from.
    NotFound { id: EntryId, collection: Collection },
    /// Submitted content was rejected before classification.
    InvalidInput(String),
    /// The state could not be read or written; nothing was committed.
    Persistence(StoreError),
}

impl LifecycleError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { id, collection } => {
                write!(f, "entry {id} not found in {collection} collection")
            }
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value)
    }
}

/// Entries created by one batch submission, in input order per group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub kept: Vec<Entry>,
    pub trashed: Vec<Entry>,
}

/// Owner of the entry collections and their persistence.
pub struct LifecycleManager<S: EntryStore> {
    store: S,
    state: RwLock<StoreState>,
    max_content_chars: usize,
}

impl<S: EntryStore> LifecycleManager<S> {
    /// Loads the persisted state and returns a ready manager.
    ///
    /// Documents written by earlier tooling are saved back immediately so
    /// the ids generated during the upgrade stay stable.
    ///
    /// # Errors
    /// - `Persistence` when the store exists but cannot be read or upgraded.
    pub fn open(store: S) -> LifecycleResult<Self> {
        let started_at = Instant::now();
        let loaded = store.load()?;
        let upgraded = loaded.needs_upgrade();
        let state = loaded.into_state();
        if upgraded {
            store.save(&state)?;
            info!(
                "event=store_upgrade module=lifecycle status=ok entries={}",
                state.len()
            );
        }

        info!(
            "event=lifecycle_open module=lifecycle status=ok active={} trash={} duration_ms={}",
            state.active().len(),
            state.trash().len(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            store,
            state: RwLock::new(state),
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
        })
    }

    /// Overrides the submitted content length limit.
    pub fn with_max_content_chars(mut self, max_content_chars: usize) -> Self {
        self.max_content_chars = max_content_chars;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Classifies `text`, stores it in the matching collection and persists.
    ///
    /// # Errors
    /// - `InvalidInput` when `text` exceeds the content length limit.
    /// - `Persistence` when the flush fails; the entry is not kept.
    pub fn submit(&self, text: impl Into<String>) -> LifecycleResult<Entry> {
        let content = text.into();
        self.check_content(&content)?;
        let category = classify(&content);
        let entry = Entry::new(content, category);

        let created = self.commit("entry_submit", |state| {
            state.push(entry.clone());
            Ok((entry, true))
        })?;
        info!(
            "event=entry_submit module=lifecycle status=ok id={} category={} status_after={}",
            created.id, created.category, created.status
        );
        Ok(created)
    }

    /// Submits many texts with a single flush.
    ///
    /// The whole batch is rejected before any mutation when one item is
    /// invalid.
    pub fn submit_batch<I, T>(&self, texts: I) -> LifecycleResult<BatchOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        for text in &texts {
            self.check_content(text)?;
        }

        let batch = classify_batch(texts);
        let outcome = BatchOutcome {
            kept: batch
                .kept
                .into_iter()
                .map(|item| Entry::new(item.content, item.category))
                .collect(),
            trashed: batch
                .trash
                .into_iter()
                .map(|item| Entry::new(item.content, item.category))
                .collect(),
        };

        let outcome = self.commit("entry_submit_batch", |state| {
            let dirty = !(outcome.kept.is_empty() && outcome.trashed.is_empty());
            for entry in outcome.kept.iter().chain(outcome.trashed.iter()) {
                state.push(entry.clone());
            }
            Ok((outcome, dirty))
        })?;
        info!(
            "event=entry_submit_batch module=lifecycle status=ok kept={} trashed={}",
            outcome.kept.len(),
            outcome.trashed.len()
        );
        Ok(outcome)
    }

    /// Moves an active entry to the tail of the trash collection.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the active collection.
    pub fn move_to_trash(&self, id: EntryId) -> LifecycleResult<Entry> {
        let moved = self.commit("entry_move_to_trash", |state| {
            let mut entry = state.take_active(id).ok_or(LifecycleError::NotFound {
                id,
                collection: Collection::Active,
            })?;
            entry.trash();
            state.push(entry.clone());
            Ok((entry, true))
        })?;
        info!("event=entry_move_to_trash module=lifecycle status=ok id={id}");
        Ok(moved)
    }

    /// Moves a trashed entry back to the tail of the active collection.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the trash collection.
    pub fn restore(&self, id: EntryId) -> LifecycleResult<Entry> {
        let restored = self.commit("entry_restore", |state| {
            let mut entry = state.take_trash(id).ok_or(LifecycleError::NotFound {
                id,
                collection: Collection::Trash,
            })?;
            entry.restore();
            state.push(entry.clone());
            Ok((entry, true))
        })?;
        info!("event=entry_restore module=lifecycle status=ok id={id}");
        Ok(restored)
    }

    /// Irrevocably removes a trashed entry.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the trash collection, including
    ///   active entries: they must be trashed first.
    pub fn delete_permanently(&self, id: EntryId) -> LifecycleResult<()> {
        self.commit("entry_delete", |state| {
            state.take_trash(id).ok_or(LifecycleError::NotFound {
                id,
                collection: Collection::Trash,
            })?;
            Ok(((), true))
        })?;
        info!("event=entry_delete module=lifecycle status=ok id={id}");
        Ok(())
    }

    /// Permanently removes every trashed entry and returns how many were
    /// removed. An empty trash is a no-op without a flush.
    pub fn empty_trash(&self) -> LifecycleResult<usize> {
        let removed = self.commit("trash_empty", |state| {
            let removed = state.clear_trash().len();
            Ok((removed, removed > 0))
        })?;
        info!("event=trash_empty module=lifecycle status=ok removed={removed}");
        Ok(removed)
    }

    /// Active entries in collection order.
    pub fn list_active(&self) -> Vec<Entry> {
        self.read(|state| state.active().to_vec())
    }

    /// Trash entries in collection order.
    pub fn list_trash(&self) -> Vec<Entry> {
        self.read(|state| state.trash().to_vec())
    }

    /// Copy of the full committed state.
    pub fn snapshot(&self) -> StoreState {
        self.read(StoreState::clone)
    }

    /// Looks up an entry in either collection.
    pub fn get(&self, id: EntryId) -> Option<Entry> {
        self.read(|state| state.get(id).cloned())
    }

    pub fn stats(&self) -> StoreStats {
        self.read(StoreState::stats)
    }

    fn check_content(&self, content: &str) -> LifecycleResult<()> {
        let chars = content.chars().count();
        if chars > self.max_content_chars {
            return Err(LifecycleError::InvalidInput(format!(
                "content has {chars} characters; limit is {}",
                self.max_content_chars
            )));
        }
        Ok(())
    }

    fn read<T>(&self, view: impl FnOnce(&StoreState) -> T) -> T {
        // Committed state is replaced wholesale, so a poisoned guard still
        // holds a consistent value.
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        view(&*guard)
    }

    /// Applies `apply` to a staged copy, flushes it when dirty and publishes
    /// it only after the flush succeeded.
    fn commit<T>(
        &self,
        event: &'static str,
        apply: impl FnOnce(&mut StoreState) -> LifecycleResult<(T, bool)>,
    ) -> LifecycleResult<T> {
        let started_at = Instant::now();
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut staged = guard.clone();

        let (value, dirty) = match apply(&mut staged) {
            Ok(result) => result,
            Err(err) => {
                if let LifecycleError::NotFound { id, collection } = &err {
                    warn!(
                        "event={event} module=lifecycle status=not_found id={id} collection={collection}"
                    );
                }
                return Err(err);
            }
        };

        if dirty {
            if let Err(err) = self.store.save(&staged) {
                error!(
                    "event={event} module=lifecycle status=error error_code=flush_failed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
            *guard = staged;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleError, LifecycleManager};
    use crate::store::memory_store::MemoryStore;

    #[test]
    fn oversized_content_is_rejected_without_flush() {
        let manager = LifecycleManager::open(MemoryStore::new())
            .unwrap()
            .with_max_content_chars(4);

        let err = manager.submit("abcdef").unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidInput(_)));
        assert_eq!(manager.store().save_count(), 0);
        assert!(manager.snapshot().is_empty());

        manager.submit("a+b").unwrap();
        assert_eq!(manager.store().save_count(), 1);
    }

    #[test]
    fn empty_trash_without_entries_skips_flush() {
        let manager = LifecycleManager::open(MemoryStore::new()).unwrap();
        assert_eq!(manager.empty_trash().unwrap(), 0);
        assert_eq!(manager.store().save_count(), 0);
    }
}
