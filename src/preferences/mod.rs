//! Persisted per-user display preferences.
//!
//! A [`DisplayPreference`] records what a user last chose for a report:
//! visible columns, sort order, grouping and filter values. Stores are keyed
//! by [`PreferenceKey`] and follow a plain read-then-write contract; the last
//! write wins.

mod sqlite;

pub use sqlite::SqlitePreferenceStore;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Identifies one user's preferences for one report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub user: String,
    pub report: String,
}

impl PreferenceKey {
    pub fn new(user: impl Into<String>, report: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            report: report.into(),
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.report)
    }
}

/// A user's saved display options for a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPreference {
    /// Visible columns, in display order. Empty is a valid choice.
    pub selected_columns: Vec<String>,
    /// Sort columns, at most four.
    pub order_columns: Vec<String>,
    /// Grouping column; `None` means no aggregation.
    pub group_by: Option<String>,
    /// Raw filter values by field key.
    pub filter_values: BTreeMap<String, String>,
}

/// Persistence collaborator for display preferences.
pub trait PreferenceStore {
    fn get(&self, key: &PreferenceKey) -> StoreResult<Option<DisplayPreference>>;

    fn set(&self, key: &PreferenceKey, preference: &DisplayPreference) -> StoreResult<()>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: RefCell<HashMap<PreferenceKey, DisplayPreference>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &PreferenceKey) -> StoreResult<Option<DisplayPreference>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &PreferenceKey, preference: &DisplayPreference) -> StoreResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.clone(), preference.clone());
        Ok(())
    }
}
