//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates
//! parameterized, multi-dialect SQL. It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`value`] - Runtime values for bound parameters and fetched rows
//! - [`token`] - Token types for SQL generation and statement binding
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;
pub mod value;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, func, lit_int, lit_str, max, min, param, raw_sql, sum, table_col, BinaryOperator, Expr,
    ExprExt, FragmentPart, Literal, IN_LIST_CHUNK,
};
pub use query::{Join, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Statement, Token, TokenStream};
pub use value::SqlValue;
