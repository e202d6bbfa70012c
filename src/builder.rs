//! Query composition from a schema, resolved options and fixed predicates.
//!
//! ```text
//! SELECT  <selected columns by kind>, <id>, <passthrough fields>
//! FROM    <base table> <caller joins, verbatim, in order>
//! WHERE   (<fixed predicate>) AND ... AND (<active filter>) AND ...
//! GROUP BY <grouping column>            -- aggregation mode only
//! ORDER BY <order columns> ASC          -- outside aggregation mode only
//! ```

use crate::options::ResolvedOptions;
use crate::schema::{ColumnSchema, FilterSet};
use crate::sql::{
    max, min, raw_sql, Expr, ExprExt, Join, OrderByExpr, Query, SelectExpr, SqlValue, TableRef,
};

/// Result field carrying the row identity.
pub const ID_FIELD: &str = "id";

// =============================================================================
// Fixed predicates
// =============================================================================

/// A business-rule condition that the request cannot change.
#[derive(Debug, Clone, PartialEq)]
pub enum FixedPredicate {
    /// `field = id1 OR field = id2 ...`; an empty list matches nothing.
    AllowList { field: String, ids: Vec<SqlValue> },
    /// `field = value`, bound.
    Equals { field: String, value: SqlValue },
    /// Trusted SQL written by report code.
    Raw(String),
}

impl FixedPredicate {
    pub fn allow_list(field: &str, ids: impl IntoIterator<Item = SqlValue>) -> Self {
        FixedPredicate::AllowList {
            field: field.to_string(),
            ids: ids.into_iter().collect(),
        }
    }

    pub fn equals(field: &str, value: impl Into<SqlValue>) -> Self {
        FixedPredicate::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn to_expr(&self) -> Expr {
        match self {
            FixedPredicate::AllowList { field, ids } => {
                Expr::any_eq(raw_sql(field), ids.iter().cloned())
            }
            FixedPredicate::Equals { field, value } => {
                raw_sql(field).eq(Expr::Param(value.clone()))
            }
            FixedPredicate::Raw(sql) => raw_sql(sql),
        }
    }
}

fn conjunct(expr: Expr) -> Expr {
    match expr {
        Expr::Paren(_) => expr,
        other => other.paren(),
    }
}

// =============================================================================
// Query source
// =============================================================================

/// Base table, joins and extra fields of a report query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySource {
    pub table: String,
    /// Verbatim join fragments, in registration order.
    pub joins: Vec<String>,
    /// Source expression of the row identity, selected as `id`.
    pub id_source: String,
    /// Extra raw fields kept on each row: (alias, source).
    pub passthrough: Vec<(String, String)>,
}

impl QuerySource {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            joins: Vec::new(),
            id_source: format!("{}.{}", table, ID_FIELD),
            passthrough: Vec::new(),
        }
    }

    pub fn with_id(mut self, source: &str) -> Self {
        self.id_source = source.to_string();
        self
    }

    pub fn join(mut self, sql: &str) -> Self {
        self.joins.push(sql.to_string());
        self
    }

    pub fn field(mut self, alias: &str, source: &str) -> Self {
        self.passthrough.push((alias.to_string(), source.to_string()));
        self
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Composes the report query for one render.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    pub schema: &'a ColumnSchema,
    pub filters: &'a FilterSet,
    pub source: &'a QuerySource,
    pub fixed: &'a [FixedPredicate],
    pub totals: &'a [String],
}

impl QueryBuilder<'_> {
    pub fn build(&self, options: &ResolvedOptions) -> Query {
        let mut query = Query::new()
            .select(self.select_list(options))
            .from(TableRef::new(&self.source.table));

        for join in &self.source.joins {
            query = query.join(Join::new(join));
        }

        for predicate in self.fixed {
            query = query.filter(conjunct(predicate.to_expr()));
        }

        for filter in self.filters.iter() {
            let Some(value) = options.filter_value(&filter.field) else {
                continue;
            };
            if let Some(clause) = filter.clause(value) {
                query = query.filter(clause.paren());
            }
        }

        match &options.group_by {
            Some(key) => {
                if let Some(column) = self.schema.get(key) {
                    query = query.group_by(column.source_exprs());
                }
            }
            None => {
                let order: Vec<OrderByExpr> = options
                    .order_columns
                    .iter()
                    .filter_map(|key| self.schema.get(key))
                    .flat_map(|column| column.source_exprs())
                    .map(OrderByExpr::asc)
                    .collect();
                if !order.is_empty() {
                    query = query.order_by(order);
                }
            }
        }

        query
    }

    fn select_list(&self, options: &ResolvedOptions) -> Vec<SelectExpr> {
        let mut items = Vec::new();
        let columns = options
            .selected_columns
            .iter()
            .filter_map(|key| self.schema.get(key));

        match &options.group_by {
            None => {
                for column in columns {
                    items.extend(column.select_items());
                }
                items.push(raw_sql(&self.source.id_source).alias(ID_FIELD));
                for (alias, source) in &self.source.passthrough {
                    items.push(raw_sql(source).alias(alias));
                }
            }
            Some(group_key) => {
                for column in columns {
                    if &column.key == group_key {
                        items.extend(column.select_items());
                    } else {
                        let summed = self.totals.contains(&column.key);
                        items.extend(column.aggregate_items(summed));
                    }
                }
                items.push(min(raw_sql(&self.source.id_source)).alias(ID_FIELD));
                for (alias, source) in &self.source.passthrough {
                    items.push(max(raw_sql(source)).alias(alias));
                }
            }
        }

        items
    }
}
