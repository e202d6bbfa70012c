//! Per-row hyperlinks.

use crate::transform::ResultRow;

/// A link template declared by report code.
///
/// Each parameter takes its value from a field of the row. With a `column`
/// the link wraps that column's cell; without one it becomes a trailing
/// action cell labelled by `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: String,
    pub target: String,
    /// (query parameter, row field)
    pub params: Vec<(String, String)>,
    pub column: Option<String>,
}

impl Link {
    pub fn new(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            params: Vec::new(),
            column: None,
        }
    }

    pub fn param(mut self, name: &str, field: &str) -> Self {
        self.params.push((name.to_string(), field.to_string()));
        self
    }

    pub fn on_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    /// Parameter values for a row; missing fields are empty.
    pub fn resolve(&self, row: &ResultRow) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(name, field)| {
                let value = row.raw(field).map(|v| v.to_string()).unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    }
}

/// Builds a URL for a link target and its parameters.
pub trait LinkRenderer {
    fn url(&self, target: &str, params: &[(String, String)]) -> String;
}

/// `<base>?page=<target>&<param>=<value>...`, percent-encoded.
#[derive(Debug, Clone)]
pub struct QueryStringLinks {
    base: String,
}

impl QueryStringLinks {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
        }
    }
}

impl Default for QueryStringLinks {
    fn default() -> Self {
        Self::new("index.php")
    }
}

impl LinkRenderer for QueryStringLinks {
    fn url(&self, target: &str, params: &[(String, String)]) -> String {
        let mut url = format!("{}?page={}", self.base, urlencoding::encode(target));
        for (name, value) in params {
            url.push('&');
            url.push_str(&urlencoding::encode(name));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}
