//! SQLite-backed preference store.
//!
//! Preferences are stored as JSON, one row per (user, report), by default in
//! `<data_dir>/reportgrid/preferences.db`.
//!
//! # Design
//!
//! - Key-value rows with JSON values
//! - Versioned: stored rows are cleared when the format version changes
//! - Last write wins

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::{DisplayPreference, PreferenceKey, PreferenceStore, StoreResult};
use crate::error::StoreError;

/// Current store format version. Bump this when `DisplayPreference` changes
/// incompatibly.
const STORE_VERSION: i32 = 1;

pub struct SqlitePreferenceStore {
    conn: Connection,
}

impl SqlitePreferenceStore {
    /// Open or create the store at the default location.
    pub fn open_default() -> StoreResult<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    pub fn default_path() -> StoreResult<PathBuf> {
        let base = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(base.join("reportgrid").join("preferences.db"))
    }

    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS preferences (
                user TEXT NOT NULL,
                report TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (user, report)
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == STORE_VERSION => {}
            Some(v) => {
                tracing::info!(from = v, to = STORE_VERSION, "preference store format changed, clearing");
                self.clear_all()?;
                self.set_version()?;
            }
            None => self.set_version()?,
        }

        Ok(())
    }

    fn set_version(&self) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![STORE_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Delete one user's preferences for a report.
    pub fn delete(&self, key: &PreferenceKey) -> StoreResult<bool> {
        let rows = self.conn.execute(
            "DELETE FROM preferences WHERE user = ? AND report = ?",
            params![key.user, key.report],
        )?;
        Ok(rows > 0)
    }

    /// Reports a user has saved preferences for.
    pub fn reports_for_user(&self, user: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT report FROM preferences WHERE user = ? ORDER BY report")?;
        let reports = stmt
            .query_map(params![user], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(reports)
    }

    pub fn clear_all(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM preferences", [])?;
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &PreferenceKey) -> StoreResult<Option<DisplayPreference>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE user = ? AND report = ?",
                params![key.user, key.report],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &PreferenceKey, preference: &DisplayPreference) -> StoreResult<()> {
        let json = serde_json::to_string(preference)?;
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT OR REPLACE INTO preferences (user, report, value, updated_at) VALUES (?, ?, ?, ?)",
            params![key.user, key.report, json, now],
        )?;
        Ok(())
    }
}
