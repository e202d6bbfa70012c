//! Expression AST - the core of SQL expression building.
//!
//! This module provides a strongly-typed AST for SQL expressions
//! with exhaustive pattern matching enforced by the compiler.
//!
//! Report schemas describe their columns with trusted SQL source expressions
//! (`timereg.date`, `CONCAT_WS(...)`), so the AST mixes structured nodes with
//! raw fragments. Anything coming from a request is carried as
//! [`Expr::Param`] and ends up bound, never spliced.

use super::dialect::Dialect;
use super::token::{Token, TokenStream};
use super::value::SqlValue;

/// Most bound values in one `IN (...)` list.
pub const IN_LIST_CHUNK: usize = 500;

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Literal values
    Literal(Literal),

    /// Bound value (placeholder in a statement).
    Param(SqlValue),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// `expr IN (v1, v2, ...)` with every value bound.
    InList { expr: Box<Expr>, values: Vec<SqlValue> },

    /// Flat disjunction `a OR b OR ...`.
    ///
    /// Kept flat so long disjunctions neither nest in the emitted SQL nor
    /// recurse while being serialized.
    AnyOf(Vec<Expr>),

    /// Function call: name(args...)
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Raw SQL expression passed directly to output without escaping.
    ///
    /// # Security Warning
    ///
    /// **Never pass user input to this variant.** Only report definitions
    /// (column sources, join fragments, fixed predicates) end up here.
    Raw(String),

    /// Trusted SQL text interleaved with bound values.
    ///
    /// Produced by filter templates: `timereg.date >= {value}` becomes
    /// `[Sql("timereg.date >= "), Param(..)]`.
    Fragment(Vec<FragmentPart>),
}

/// One piece of an [`Expr::Fragment`].
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentPart {
    Sql(String),
    Param(SqlValue),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Gte,
    // Logical
    And,
    Or,
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream (default dialect).
    pub fn to_tokens(&self) -> TokenStream {
        self.to_tokens_for_dialect(Dialect::default())
    }

    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Null => Token::LitNull,
                });
            }

            Expr::Param(value) => {
                ts.push(Token::Param(value.clone()));
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens_for_dialect(dialect));
                ts.space();
                ts.push(binary_op_to_token(*op));
                ts.space();
                ts.append(&right.to_tokens_for_dialect(dialect));
            }

            Expr::InList { expr, values } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space().push(Token::In).space().lparen();
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Param(value.clone()));
                }
                ts.rparen();
            }

            Expr::AnyOf(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        ts.space().push(Token::Or).space();
                    }
                    ts.append(&term.to_tokens_for_dialect(dialect));
                }
            }

            Expr::Function {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::FunctionName(name.clone()));
                ts.lparen();
                if *distinct {
                    ts.push(Token::Distinct).space();
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.to_tokens_for_dialect(dialect));
                }
                ts.rparen();
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space().push(Token::Raw(
                    if *negated { "IS NOT NULL" } else { "IS NULL" }.into(),
                ));
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens_for_dialect(dialect));
                ts.rparen();
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }

            Expr::Fragment(parts) => {
                for part in parts {
                    ts.push(match part {
                        FragmentPart::Sql(sql) => Token::Raw(sql.clone()),
                        FragmentPart::Param(value) => Token::Param(value.clone()),
                    });
                }
            }
        }

        ts
    }

    /// Membership test `expr IN (...)`, parenthesized.
    ///
    /// Values are split into `IN` lists of at most [`IN_LIST_CHUNK`] entries
    /// joined by `OR`. An empty value list yields `1 = 0`: a predicate that
    /// matches no rows, never an unconstrained one.
    pub fn any_eq(expr: Expr, values: impl IntoIterator<Item = SqlValue>) -> Expr {
        let values: Vec<SqlValue> = values.into_iter().collect();
        if values.is_empty() {
            return lit_int(1).eq(lit_int(0));
        }

        let mut lists: Vec<Expr> = values
            .chunks(IN_LIST_CHUNK)
            .map(|chunk| Expr::InList {
                expr: Box::new(expr.clone()),
                values: chunk.to_vec(),
            })
            .collect();

        let inner = if lists.len() == 1 {
            lists.remove(0)
        } else {
            Expr::AnyOf(lists)
        };
        Expr::Paren(Box::new(inner))
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create a bound parameter.
pub fn param(value: impl Into<SqlValue>) -> Expr {
    Expr::Param(value.into())
}

/// Raw SQL expression (pass-through, no parsing).
///
/// # Security Warning
///
/// **Never pass user input to this function.** The SQL is not sanitized.
pub fn raw_sql(sql: &str) -> Expr {
    Expr::Raw(sql.into())
}

/// SUM(expr)
pub fn sum(expr: Expr) -> Expr {
    func("SUM", vec![expr])
}

/// MIN(expr)
pub fn min(expr: Expr) -> Expr {
    func("MIN", vec![expr])
}

/// MAX(expr)
pub fn max(expr: Expr) -> Expr {
    func("MAX", vec![expr])
}

/// Generic function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
        distinct: false,
    }
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binary(self, op: BinaryOperator, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other.into()),
        }
    }

    // Comparison operators
    fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    fn gte(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Gte, other)
    }

    // Logical operators
    fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Or, other)
    }

    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self.into_expr()))
    }

    /// Create an alias for use in SELECT.
    fn alias(self, name: &str) -> crate::sql::query::SelectExpr {
        crate::sql::query::SelectExpr::new(self.into_expr()).with_alias(name)
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Expr::Param(value)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

// =============================================================================
// Tests
// =============================================================================
