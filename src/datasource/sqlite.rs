//! SQLite-backed data source.

use std::path::Path;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use super::{DataSource, Row, RowSet};
use crate::error::QueryError;
use crate::sql::{Dialect, SqlValue, Statement};

/// Executes statements against a SQLite database.
pub struct SqliteDataSource {
    conn: Connection,
}

impl SqliteDataSource {
    /// Open an existing database read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, QueryError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for fixtures and testing).
    pub fn open_in_memory() -> Result<Self, QueryError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Run a batch of statements, e.g. to load a fixture.
    pub fn execute_batch(&self, sql: &str) -> Result<(), QueryError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl DataSource for SqliteDataSource {
    fn query(&self, statement: &Statement) -> Result<RowSet, QueryError> {
        tracing::debug!(
            sql = %statement.sql,
            params = statement.params.len(),
            "executing statement"
        );

        let mut stmt = self.conn.prepare(&statement.sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let rows = stmt
            .query_map(params_from_iter(statement.params.iter()), |row| {
                let mut out = Row::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    out.insert(name.clone(), row.get::<_, SqlValue>(i)?);
                }
                Ok(out)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RowSet { columns, rows })
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Int(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            SqlValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for SqlValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(n) => SqlValue::Int(n),
            ValueRef::Real(f) => SqlValue::Float(f),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        })
    }
}
