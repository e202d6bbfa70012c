//! Row transformation: raw fetched rows to display-ready result rows.
//!
//! Every schema column is rendered on every row, whether or not it was
//! selected; a column that was not fetched renders from NULL. Drop rules and
//! totals produce new result sets and never touch the fetched rows.

use std::collections::HashMap;
use std::fmt;

use crate::builder::ID_FIELD;
use crate::datasource::{Row, RowSet};
use crate::schema::{Column, ColumnKind, ColumnSchema, RawCell};
use crate::sql::SqlValue;

/// A rendered cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub raw: RawCell,
    pub display: String,
}

impl Cell {
    pub fn render(kind: ColumnKind, raw: RawCell) -> Self {
        let display = kind.render(&raw);
        Self { raw, display }
    }
}

/// One transformed row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Row identity, used by links.
    pub id: SqlValue,
    cells: Vec<(String, Cell)>,
    /// Extra fields fetched for page logic and links, kept raw.
    pub passthrough: HashMap<String, SqlValue>,
}

impl ResultRow {
    pub fn cell(&self, key: &str) -> Option<&Cell> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    /// Rendered text of a column; empty when unknown.
    pub fn display(&self, key: &str) -> &str {
        self.cell(key).map(|c| c.display.as_str()).unwrap_or("")
    }

    /// Raw value of a passthrough field, the row id, or a column.
    pub fn raw(&self, field: &str) -> Option<SqlValue> {
        if field == ID_FIELD {
            return Some(self.id.clone());
        }
        if let Some(value) = self.passthrough.get(field) {
            return Some(value.clone());
        }
        self.cell(field).map(|c| c.raw.to_value())
    }
}

/// A post-fetch predicate; rows it matches are excluded.
pub struct DropRule {
    pub name: String,
    predicate: Box<dyn Fn(&ResultRow) -> bool>,
}

impl DropRule {
    pub fn new(name: &str, predicate: impl Fn(&ResultRow) -> bool + 'static) -> Self {
        Self {
            name: name.to_string(),
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, row: &ResultRow) -> bool {
        (self.predicate)(row)
    }
}

impl fmt::Debug for DropRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropRule").field("name", &self.name).finish()
    }
}

/// Transformed rows of one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<ResultRow>,
    fetched: usize,
    totals: Option<Vec<(String, Cell)>>,
}

impl ResultSet {
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows returned by the data source, before drop rules.
    pub fn fetched_count(&self) -> usize {
        self.fetched
    }

    pub fn totals(&self) -> Option<&[(String, Cell)]> {
        self.totals.as_deref()
    }

    pub fn total(&self, key: &str) -> Option<&Cell> {
        self.totals
            .as_ref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c)
    }

    /// A new set without the rows any rule matches.
    pub fn without(&self, rules: &[DropRule]) -> ResultSet {
        let rows: Vec<ResultRow> = self
            .rows
            .iter()
            .filter(|row| {
                match rules.iter().find(|rule| rule.matches(row)) {
                    Some(rule) => {
                        tracing::trace!(rule = %rule.name, id = %row.id, "dropping row");
                        false
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();

        ResultSet {
            rows,
            fetched: self.fetched,
            totals: None,
        }
    }

    /// A new set with the given columns summed over its rows.
    pub fn with_totals(mut self, schema: &ColumnSchema, columns: &[String]) -> ResultSet {
        if columns.is_empty() {
            self.totals = None;
            return self;
        }

        let totals = columns
            .iter()
            .filter_map(|key| schema.get(key))
            .map(|column| (column.key.clone(), sum_column(column, &self.rows)))
            .collect();
        self.totals = Some(totals);
        self
    }
}

fn sum_column(column: &Column, rows: &[ResultRow]) -> Cell {
    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut all_int = true;

    for cell in rows.iter().filter_map(|r| r.cell(&column.key)) {
        match &cell.raw {
            RawCell::Value(SqlValue::Int(n)) => {
                int_total = int_total.saturating_add(*n);
                float_total += *n as f64;
            }
            raw => {
                if let Some(f) = raw.as_f64() {
                    all_int &= f.fract() == 0.0 && !matches!(raw, RawCell::Value(SqlValue::Float(_)));
                    int_total = int_total.saturating_add(f as i64);
                    float_total += f;
                }
            }
        }
    }

    let value = if all_int {
        SqlValue::Int(int_total)
    } else {
        SqlValue::Float(float_total)
    };
    Cell::render(column.kind, RawCell::Value(value))
}

/// Maps fetched rows onto the schema.
#[derive(Debug, Clone, Copy)]
pub struct ResultTransformer<'a> {
    pub schema: &'a ColumnSchema,
    /// Extra fields to keep raw on each row.
    pub passthrough: &'a [String],
}

impl ResultTransformer<'_> {
    pub fn transform(&self, rowset: &RowSet) -> ResultSet {
        let rows = rowset.rows.iter().map(|row| self.transform_row(row)).collect();
        ResultSet {
            rows,
            fetched: rowset.len(),
            totals: None,
        }
    }

    fn transform_row(&self, row: &Row) -> ResultRow {
        let field = |name: &str| row.get(name).cloned().unwrap_or_default();

        let cells = self
            .schema
            .iter()
            .map(|column| {
                let raw = match column.kind {
                    ColumnKind::Fullname => {
                        let names = column.field_names();
                        RawCell::Name {
                            first: field(&names[0]),
                            last: field(&names[1]),
                        }
                    }
                    _ => RawCell::Value(field(&column.key)),
                };
                (column.key.clone(), Cell::render(column.kind, raw))
            })
            .collect();

        let passthrough = self
            .passthrough
            .iter()
            .map(|name| (name.clone(), field(name)))
            .collect();

        ResultRow {
            id: field(ID_FIELD),
            cells,
            passthrough,
        }
    }
}
