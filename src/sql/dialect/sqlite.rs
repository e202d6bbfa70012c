//! SQLite SQL dialect.
//!
//! SQLite is the execution backend of the bundled data source:
//! - ANSI identifier quoting (`"`)
//! - `?` positional placeholders

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }
}
