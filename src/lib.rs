//! # reportgrid
//!
//! Configurable tabular reports over SQL data.
//!
//! ## Architecture
//!
//! A report page declares columns, filters and business-rule predicates;
//! each render resolves the user's display options and runs one query:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Report page (pre-query → allow-list predicate)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │            ColumnSchema + FilterSet (frozen)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [options] request > persisted > default
//! ┌─────────────────────────────────────────────────────────┐
//! │                   ResolvedOptions                        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder] → [sql] → [datasource]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      RowSet                              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [transform] render, drop, total
//! ┌─────────────────────────────────────────────────────────┐
//! │           ResultSet → [render] HTML or CSV               │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod builder;
pub mod config;
pub mod datasource;
pub mod error;
pub mod options;
pub mod pages;
pub mod preferences;
pub mod render;
pub mod report;
pub mod schema;
pub mod sql;
pub mod transform;

pub use builder::{FixedPredicate, QueryBuilder, QuerySource};
pub use error::{ConfigError, QueryError, ReportError, ReportResult, StoreError, ValidationError};
pub use options::{RequestParams, ResolvedOptions};
pub use report::{RenderEnv, Report, ReportBuilder};
pub use schema::{ColumnKind, ColumnSchema, Filter, FilterSet};
pub use transform::{DropRule, ResultRow, ResultSet};
