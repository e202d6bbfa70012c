//! Column definitions and the immutable column schema.
//!
//! A column couples a unique key with a [`ColumnKind`] and a trusted SQL
//! source expression. The kind decides both halves of the column's life:
//! which select fragments it contributes and how a fetched value is rendered.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::format;
use crate::error::{ConfigError, ConfigResult};
use crate::sql::{max, raw_sql, sum, Expr, ExprExt, SelectExpr, SqlValue};

// =============================================================================
// Column kinds
// =============================================================================

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Pass-through.
    Standard,
    /// Unix timestamp rendered as `DD-MM-YYYY`.
    Date,
    /// Source is a field prefix with `_firstname` / `_lastname` parts.
    Fullname,
    /// Amount with a currency prefix.
    Price,
    /// Duration in seconds rendered as `H:MM[:SS]`.
    Hourmins,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Standard => "standard",
            ColumnKind::Date => "date",
            ColumnKind::Fullname => "fullname",
            ColumnKind::Price => "price",
            ColumnKind::Hourmins => "hourmins",
        }
    }

    /// Render a fetched cell. Pure in (kind, raw).
    pub fn render(&self, raw: &RawCell) -> String {
        match (self, raw) {
            (ColumnKind::Fullname, RawCell::Name { first, last }) => {
                format::format_fullname(first, last)
            }
            (ColumnKind::Fullname, RawCell::Value(v)) => format::format_fullname(v, &SqlValue::Null),
            (kind, RawCell::Name { first, last }) => {
                kind.render(&RawCell::Value(SqlValue::from(format::format_fullname(first, last))))
            }
            (ColumnKind::Standard, RawCell::Value(v)) => v.to_string(),
            (ColumnKind::Date, RawCell::Value(v)) => format::format_date(v),
            (ColumnKind::Price, RawCell::Value(v)) => format::format_price(v),
            (ColumnKind::Hourmins, RawCell::Value(v)) => format::format_hourmins_value(v),
        }
    }

    /// Whether a totals row may sum this kind.
    pub fn is_summable(&self) -> bool {
        matches!(
            self,
            ColumnKind::Standard | ColumnKind::Price | ColumnKind::Hourmins
        )
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ColumnKind::Standard),
            "date" => Ok(ColumnKind::Date),
            "fullname" => Ok(ColumnKind::Fullname),
            "price" => Ok(ColumnKind::Price),
            "hourmins" => Ok(ColumnKind::Hourmins),
            other => Err(format!("unknown column kind: {}", other)),
        }
    }
}

/// The raw fetched value(s) behind one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Value(SqlValue),
    Name { first: SqlValue, last: SqlValue },
}

impl RawCell {
    pub fn null() -> Self {
        RawCell::Value(SqlValue::Null)
    }

    /// Numeric view used when summing totals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawCell::Value(v) => v.as_f64(),
            RawCell::Name { .. } => None,
        }
    }

    /// Single-value view; names are joined.
    pub fn to_value(&self) -> SqlValue {
        match self {
            RawCell::Value(v) => v.clone(),
            RawCell::Name { first, last } => SqlValue::from(format::format_fullname(first, last)),
        }
    }
}

impl From<SqlValue> for RawCell {
    fn from(value: SqlValue) -> Self {
        RawCell::Value(value)
    }
}

// =============================================================================
// Column
// =============================================================================

/// A single column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub kind: ColumnKind,
    pub source: String,
}

const FIRSTNAME_SUFFIX: &str = "_firstname";
const LASTNAME_SUFFIX: &str = "_lastname";

impl Column {
    /// Result field names this column is fetched under.
    pub fn field_names(&self) -> Vec<String> {
        match self.kind {
            ColumnKind::Fullname => vec![
                format!("{}{}", self.key, FIRSTNAME_SUFFIX),
                format!("{}{}", self.key, LASTNAME_SUFFIX),
            ],
            _ => vec![self.key.clone()],
        }
    }

    /// Source expressions, one per fetched field.
    pub fn source_exprs(&self) -> Vec<Expr> {
        match self.kind {
            ColumnKind::Fullname => vec![
                raw_sql(&format!("{}{}", self.source, FIRSTNAME_SUFFIX)),
                raw_sql(&format!("{}{}", self.source, LASTNAME_SUFFIX)),
            ],
            _ => vec![raw_sql(&self.source)],
        }
    }

    /// Plain select fragments aliased by field name.
    pub fn select_items(&self) -> Vec<SelectExpr> {
        self.source_exprs()
            .into_iter()
            .zip(self.field_names())
            .map(|(expr, alias)| expr.alias(&alias))
            .collect()
    }

    /// Aggregated select fragments: summed for totals, MAX otherwise so the
    /// grouped row still carries a value.
    pub fn aggregate_items(&self, summed: bool) -> Vec<SelectExpr> {
        self.source_exprs()
            .into_iter()
            .zip(self.field_names())
            .map(|(expr, alias)| {
                let agg = if summed { sum(expr) } else { max(expr) };
                agg.alias(&alias)
            })
            .collect()
    }
}

// =============================================================================
// Schema
// =============================================================================

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Mutable accumulator for column definitions.
#[derive(Debug, Clone, Default)]
pub struct ColumnSchemaBuilder {
    columns: Vec<Column>,
}

impl ColumnSchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a column. An empty source defaults to the key.
    ///
    /// Re-registering an identical definition is a no-op; a different kind or
    /// source under the same key is a [`ConfigError::DuplicateColumn`].
    pub fn add_column(
        &mut self,
        kind: ColumnKind,
        key: &str,
        source: &str,
    ) -> ConfigResult<&mut Self> {
        if !is_valid_key(key) {
            return Err(ConfigError::InvalidColumnKey(key.to_string()));
        }
        let source = if source.trim().is_empty() { key } else { source };

        if let Some(existing) = self.columns.iter().find(|c| c.key == key) {
            if existing.kind == kind && existing.source == source {
                return Ok(self);
            }
            return Err(ConfigError::DuplicateColumn {
                key: key.to_string(),
                existing: format!("{} '{}'", existing.kind, existing.source),
                requested: format!("{} '{}'", kind, source),
            });
        }

        self.columns.push(Column {
            key: key.to_string(),
            kind,
            source: source.to_string(),
        });
        Ok(self)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.key == key)
    }

    /// Freeze the definitions.
    pub fn build(self) -> ColumnSchema {
        let index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();
        ColumnSchema {
            columns: self.columns,
            index,
        }
    }
}

/// Immutable, ordered set of column definitions.
#[derive(Debug, Clone, Default)]
pub struct ColumnSchema {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl ColumnSchema {
    pub fn builder() -> ColumnSchemaBuilder {
        ColumnSchemaBuilder::new()
    }

    pub fn get(&self, key: &str) -> Option<&Column> {
        self.index.get(key).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Columns in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn keys(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column or fail with the referencing context.
    pub fn require(&self, key: &str, context: &str) -> ConfigResult<&Column> {
        self.get(key).ok_or_else(|| ConfigError::UnknownColumn {
            column: key.to_string(),
            context: context.to_string(),
        })
    }
}
