//! Entry domain model.
//!
//! # Responsibility
//! - Define the classified record stored in the active and trash collections.
//! - Provide the status transitions used by the lifecycle manager.
//!
//! # Invariants
//! - `id` is stable and never reused for another entry.
//! - `content`, `category` and `created_at` never change after creation.
//! - `status` is the only field mutated by lifecycle transitions.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every entry.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntryId = Uuid;

/// Persisted timestamp layout, matching files written by earlier tooling.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classifier verdict attached to an entry at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Text made only of letters, digits, arithmetic operators and whitespace.
    Formula,
    /// Retained text that is neither a formula nor trash.
    Normal,
    /// Blank, symbol-only or digit-only text.
    Trash,
}

impl Category {
    /// Returns the stable lowercase label used in storage and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formula => "formula",
            Self::Normal => "normal",
            Self::Trash => "trash",
        }
    }

    /// Returns whether entries of this category start in the active collection.
    pub fn is_kept(self) -> bool {
        !matches!(self, Self::Trash)
    }

    /// Status an entry of this category receives when it is created.
    pub fn initial_status(self) -> EntryStatus {
        if self.is_kept() {
            EntryStatus::Active
        } else {
            EntryStatus::Trashed
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection membership of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    #[serde(rename = "active")]
    Active,
    /// Stored under the `trash` label for compatibility with existing files.
    #[serde(rename = "trash")]
    Trashed,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trashed => "trash",
        }
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Original submitted text, stored verbatim.
    pub content: String,
    /// Local wall-clock creation time, second precision.
    #[serde(rename = "timestamp", with = "timestamp_format")]
    pub created_at: NaiveDateTime,
    pub status: EntryStatus,
    /// Serialized as `type` to match the persisted schema.
    #[serde(rename = "type")]
    pub category: Category,
}

impl Entry {
    /// Creates a new entry with a generated id and the current local time.
    ///
    /// # Invariants
    /// - Initial status follows the category (`trash` starts trashed).
    /// - Sub-second precision is dropped so the timestamp survives a
    ///   persistence round trip unchanged.
    pub fn new(content: impl Into<String>, category: Category) -> Self {
        Self::with_id(Uuid::new_v4(), content, category, now_seconds())
    }

    /// Creates an entry with caller-provided identity and creation time.
    ///
    /// Used by the legacy import path and by tests.
    pub fn with_id(
        id: EntryId,
        content: impl Into<String>,
        category: Category,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            created_at,
            status: category.initial_status(),
            category,
        }
    }

    /// Marks this entry as trashed.
    pub fn trash(&mut self) {
        self.status = EntryStatus::Trashed;
    }

    /// Marks this entry as active again.
    pub fn restore(&mut self) {
        self.status = EntryStatus::Active;
    }

    pub fn is_active(&self) -> bool {
        self.status == EntryStatus::Active
    }
}

fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Serde adapter for the `%Y-%m-%d %H:%M:%S` timestamp layout.
pub(crate) mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
