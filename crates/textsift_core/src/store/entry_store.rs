//! Persistence contract for the entry collections.
//!
//! # Responsibility
//! - Define how the full `StoreState` is loaded and saved.
//! - Provide semantic errors that separate "nothing stored yet" from
//!   "stored data is unreadable".
//!
//! # Invariants
//! - `load` never maps a malformed document to an empty state.
//! - `save` replaces the whole persisted state or leaves it untouched.

use crate::store::state::{StateValidationError, StoreState};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure for load and save operations.
#[derive(Debug)]
pub enum StoreError {
    /// Reading, writing or replacing the backing file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The backing file is not a valid store document.
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The document parsed but violates store invariants.
    InvalidData { path: PathBuf, message: String },
    /// The in-memory state could not be encoded.
    Serialize(serde_json::Error),
}

impl StoreError {
    pub(crate) fn invalid_data(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidData {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn from_validation(path: impl Into<PathBuf>, err: StateValidationError) -> Self {
        Self::invalid_data(path, err.to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "store I/O failed at `{}`: {source}", path.display()),
            Self::Malformed { path, source } => {
                write!(f, "store file `{}` is malformed: {source}", path.display())
            }
            Self::InvalidData { path, message } => {
                write!(f, "invalid store data in `{}`: {message}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to encode store state: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { source, .. } => Some(source),
            Self::InvalidData { .. } => None,
            Self::Serialize(err) => Some(err),
        }
    }
}

/// Outcome of reading the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLoad {
    /// Nothing has been persisted yet.
    Missing,
    /// A current-format document.
    Current(StoreState),
    /// A document from earlier tooling, upgraded in memory. Callers should
    /// save it back so generated ids become stable.
    Legacy(StoreState),
}

impl StoreLoad {
    pub fn into_state(self) -> StoreState {
        match self {
            Self::Missing => StoreState::empty(),
            Self::Current(state) | Self::Legacy(state) => state,
        }
    }

    pub fn needs_upgrade(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }
}

/// Durable storage for the full entry state.
pub trait EntryStore {
    /// Reads the persisted state.
    fn load(&self) -> StoreResult<StoreLoad>;
    /// Atomically replaces the persisted state with `state`.
    fn save(&self, state: &StoreState) -> StoreResult<()>;
}

impl<S: EntryStore + ?Sized> EntryStore for &S {
    fn load(&self) -> StoreResult<StoreLoad> {
        (**self).load()
    }

    fn save(&self, state: &StoreState) -> StoreResult<()> {
        (**self).save(state)
    }
}
