//! Data sources: where report statements are executed.

mod sqlite;

pub use sqlite::SqliteDataSource;

use std::collections::HashMap;

use crate::error::QueryError;
use crate::sql::{Dialect, SqlValue, Statement};

/// One fetched row, keyed by result field name.
pub type Row = HashMap<String, SqlValue>;

/// Rows returned by a statement, with the field names in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-null values of one field, in row order.
    pub fn values(&self, field: &str) -> Vec<SqlValue> {
        self.rows
            .iter()
            .filter_map(|row| row.get(field))
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }
}

/// Executes read-only statements.
///
/// A failing statement is a [`QueryError`]; zero rows is an empty
/// [`RowSet`].
pub trait DataSource {
    fn query(&self, statement: &Statement) -> Result<RowSet, QueryError>;

    /// Dialect the statements must be generated for.
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}
