//! Declarative report schema: columns and filters.

pub mod column;
pub mod filter;
pub mod format;

pub use column::{Column, ColumnKind, ColumnSchema, ColumnSchemaBuilder, RawCell};
pub use filter::{
    Filter, FilterKind, FilterOption, FilterSet, Template, ValueSource, GROUP_BY_FIELD,
    GROUP_BY_NONE,
};
pub use format::{format_hourmins, parse_hourmins};
