//! Core logic for textsift: classify free text and keep it in active and
//! trash collections backed by a durable store.
//! This crate is the single source of truth for lifecycle invariants.

pub mod classify;
pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use classify::classifier::{classify, classify_batch, BatchClassification, ClassifiedText};
pub use config::{default_config_path, ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{Category, Entry, EntryId, EntryStatus, TIMESTAMP_FORMAT};
pub use service::lifecycle::{
    BatchOutcome, Collection, LifecycleError, LifecycleManager, LifecycleResult,
    DEFAULT_MAX_CONTENT_CHARS,
};
pub use store::entry_store::{EntryStore, StoreError, StoreLoad, StoreResult};
pub use store::json_store::{JsonFileStore, STORE_FORMAT_VERSION};
pub use store::memory_store::MemoryStore;
pub use store::state::{StateValidationError, StoreState, StoreStats};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
