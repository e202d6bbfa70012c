//! Error types for report construction, execution and rendering.
//!
//! The variants follow the propagation policy of the engine:
//! - [`ConfigError`] is a programmer error and aborts schema construction.
//! - [`QueryError`] is recovered at the render boundary as a diagnostic.
//! - [`ValidationError`] is logged and the offending input is ignored.
//! - [`StoreError`] is logged; the render proceeds with resolved options.

use std::path::PathBuf;

/// Result type for schema construction.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Invalid column, filter, link or totals definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Column '{key}' is already defined as {existing} and cannot be redefined as {requested}")]
    DuplicateColumn {
        key: String,
        existing: String,
        requested: String,
    },

    #[error("Invalid column key '{0}': use ASCII letters, digits and '_'")]
    InvalidColumnKey(String),

    #[error("Unknown column '{column}' referenced by {context}")]
    UnknownColumn { column: String, context: String },

    #[error("Filter '{0}' is already defined")]
    DuplicateFilter(String),

    #[error("Filter '{field}' has an invalid template: {reason}")]
    InvalidTemplate { field: String, reason: String },

    #[error("Filter '{field}' is misconfigured: {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("Column '{0}' cannot be totalled: only numeric column kinds can be summed")]
    NotSummable(String),

    #[error("Result field '{0}' is fetched twice: a column, passthrough field or the row id share the name")]
    DuplicateField(String),
}

/// Malformed request input. Never propagated past options resolution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Filter '{field}': invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },

    #[error("Filter '{field}': '{value}' is not one of the available choices")]
    UnknownChoice { field: String, value: String },

    #[error("Filter '{field}': text input rejected ({reason})")]
    RejectedText { field: String, reason: String },

    #[error("Unknown column '{0}' in display options")]
    UnknownColumn(String),
}

/// Data-source execution failure, distinct from "zero rows".
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Query failed: {0}")]
    Failed(String),

    #[error("Lookup for filter '{field}' failed: {message}")]
    Lookup { field: String, message: String },
}

/// Preference persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to determine data directory")]
    NoDataDir,
}

/// Output failure while writing an export.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Umbrella error for the report façade and the CLI.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Settings(#[from] crate::config::SettingsError),

    #[error("Unknown report page: {0}")]
    UnknownPage(String),

    #[error("Missing or invalid request parameter '{name}'")]
    InvalidParam { name: String },

    #[error("Database not found: {0}")]
    DatabaseNotFound(PathBuf),
}

pub type ReportResult<T> = Result<T, ReportError>;
