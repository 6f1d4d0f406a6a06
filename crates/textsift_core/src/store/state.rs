//! In-memory active/trash collections.
//!
//! # Responsibility
//! - Hold the two ordered collections as one value that can be copied,
//!   persisted and compared.
//! - Offer the primitive moves the lifecycle manager composes.
//!
//! # Invariants
//! - Every entry lives in exactly one collection.
//! - Entries in `active` have `status = active`; entries in `trash` have
//!   `status = trash`.
//! - Ids are unique across both collections.

use crate::model::entry::{Category, Entry, EntryId, EntryStatus};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Structural violation found while assembling a `StoreState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValidationError {
    DuplicateId(EntryId),
    StatusMismatch {
        id: EntryId,
        expected: EntryStatus,
        actual: EntryStatus,
    },
}

impl Display for StateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "entry id {id} appears more than once"),
            Self::StatusMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "entry {id} has status `{actual}` but is stored in the `{expected}` collection"
            ),
        }
    }
}

impl Error for StateValidationError {}

/// Per-category counters over the current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub active_formulas: usize,
    pub active_normal: usize,
    pub trash: usize,
    pub total: usize,
}

/// Full set of collections owned by one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    active: Vec<Entry>,
    trash: Vec<Entry>,
}

impl StoreState {
    /// Returns a state with both collections empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a state from persisted collections, checking invariants.
    ///
    /// # Errors
    /// - `StatusMismatch` when an entry's status disagrees with its collection.
    /// - `DuplicateId` when an id occurs twice across both collections.
    pub fn from_parts(active: Vec<Entry>, trash: Vec<Entry>) -> Result<Self, StateValidationError> {
        let mut seen = HashSet::with_capacity(active.len() + trash.len());
        for (entries, expected) in [(&active, EntryStatus::Active), (&trash, EntryStatus::Trashed)] {
            for entry in entries {
                if entry.status != expected {
                    return Err(StateValidationError::StatusMismatch {
                        id: entry.id,
                        expected,
                        actual: entry.status,
                    });
                }
                if !seen.insert(entry.id) {
                    return Err(StateValidationError::DuplicateId(entry.id));
                }
            }
        }
        Ok(Self { active, trash })
    }

    pub fn active(&self) -> &[Entry] {
        &self.active
    }

    pub fn trash(&self) -> &[Entry] {
        &self.trash
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.trash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.trash.is_empty()
    }

    /// Looks up an entry in either collection.
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.active
            .iter()
            .chain(self.trash.iter())
            .find(|entry| entry.id == id)
    }

    pub fn stats(&self) -> StoreStats {
        let active_formulas = self
            .active
            .iter()
            .filter(|entry| entry.category == Category::Formula)
            .count();
        StoreStats {
            active_formulas,
            active_normal: self.active.len() - active_formulas,
            trash: self.trash.len(),
            total: self.len(),
        }
    }

    /// Appends an entry to the tail of the collection matching its status.
    pub(crate) fn push(&mut self, entry: Entry) {
        match entry.status {
            EntryStatus::Active => self.active.push(entry),
            EntryStatus::Trashed => self.trash.push(entry),
        }
    }

    pub(crate) fn take_active(&mut self, id: EntryId) -> Option<Entry> {
        take_by_id(&mut self.active, id)
    }

    pub(crate) fn take_trash(&mut self, id: EntryId) -> Option<Entry> {
        take_by_id(&mut self.trash, id)
    }

    pub(crate) fn clear_trash(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.trash)
    }
}

fn take_by_id(entries: &mut Vec<Entry>, id: EntryId) -> Option<Entry> {
    let index = entries.iter().position(|entry| entry.id == id)?;
    Some(entries.remove(index))
}
