//! Runtime SQL values - bound parameters and fetched cells.
//!
//! The same type travels in both directions: filter inputs and allow-list
//! members are bound as `SqlValue`s, and data sources hand rows back as
//! `field -> SqlValue` maps.

use std::fmt;

/// A dynamically typed SQL value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlValue {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// NULL or a blank string.
    pub fn is_blank(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Interpret as an integer; numeric text is parsed, floats are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(n) => Some(*n),
            SqlValue::Float(f) if f.is_finite() => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret as a float; numeric text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(n) => Some(*n as f64),
            SqlValue::Float(f) => Some(*f),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null => None,
        }
    }

    /// A truthy check matching how the business tables store flags and
    /// foreign keys: NULL, 0, "" and "0" are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            SqlValue::Null => false,
            SqlValue::Int(n) => *n != 0,
            SqlValue::Float(f) => *f != 0.0,
            SqlValue::Text(s) => {
                let s = s.trim();
                !s.is_empty() && s != "0"
            }
        }
    }
}

impl fmt::Display for SqlValue {
    /// Natural text form; NULL is empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => Ok(()),
            SqlValue::Int(n) => write!(f, "{}", n),
            SqlValue::Float(x) => {
                let mut buffer = ryu::Buffer::new();
                let s = buffer.format(*x);
                write!(f, "{}", s.strip_suffix(".0").unwrap_or(s))
            }
            SqlValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Int(n)
    }
}

impl From<i32> for SqlValue {
    fn from(n: i32) -> Self {
        SqlValue::Int(n as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Float(f)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.into())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}
