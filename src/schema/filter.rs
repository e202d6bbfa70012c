//! Filters: named, request-adjustable predicates.
//!
//! Each filter owns a query template with a value placeholder. The template
//! is trusted SQL written by report code; the value always comes from the
//! request and is bound, never spliced:
//!
//! - `{value}` binds the sanitized value as-is.
//! - `{%value%}` binds a LIKE-contains pattern `%value%`.
//!
//! The placeholder may appear several times to bind the same value into
//! several comparisons (`a LIKE {%value%} OR b LIKE {%value%}`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::column::ColumnSchema;
use super::format::parse_date_input;
use crate::datasource::DataSource;
use crate::error::{ConfigError, ConfigResult, QueryError, ValidationError};
use crate::sql::{Expr, FragmentPart, SqlValue, Statement};

/// Field key of the reserved grouping selector.
pub const GROUP_BY_FIELD: &str = "groupby";

/// Grouping selector value meaning "no aggregation".
pub const GROUP_BY_NONE: &str = "none";

/// Maximum accepted length of a free-text filter value.
pub const MAX_TEXT_LEN: usize = 255;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());

// =============================================================================
// Filter kinds and value sources
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Date,
    Dropdown,
    Text,
    Radio,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterKind::Date => "date",
            FilterKind::Dropdown => "dropdown",
            FilterKind::Text => "text",
            FilterKind::Radio => "radio",
        })
    }
}

/// One selectable choice of a dropdown or radio filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub id: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Where a filter's choices come from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValueSource {
    #[default]
    None,
    Static(Vec<FilterOption>),
    /// Trusted SQL returning `id`, `label` and optionally `label1`.
    Lookup(String),
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TemplatePart {
    Sql(String),
    Value,
    Contains,
}

/// A parsed filter template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    text: String,
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn parse(field: &str, text: &str) -> ConfigResult<Self> {
        let invalid = |reason: String| ConfigError::InvalidTemplate {
            field: field.to_string(),
            reason,
        };

        let mut parts = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            if whole.start > last {
                parts.push(TemplatePart::Sql(text[last..whole.start].to_string()));
            }
            parts.push(match &caps[1] {
                "value" => TemplatePart::Value,
                "%value%" => TemplatePart::Contains,
                other => return Err(invalid(format!("unknown placeholder '{{{}}}'", other))),
            });
            last = whole.end;
        }
        if last < text.len() {
            parts.push(TemplatePart::Sql(text[last..].to_string()));
        }

        let has_value = parts.iter().any(|p| !matches!(p, TemplatePart::Sql(_)));
        if !has_value {
            return Err(invalid("no {value} placeholder".to_string()));
        }
        let mixed = parts.contains(&TemplatePart::Value) && parts.contains(&TemplatePart::Contains);
        if mixed {
            return Err(invalid(
                "mixes {value} and {%value%}; use one placeholder form".to_string(),
            ));
        }

        Ok(Self {
            text: text.to_string(),
            parts,
        })
    }

    /// Bind a sanitized value into every placeholder.
    ///
    /// `{%value%}` matches the value literally: LIKE wildcards in it are
    /// escaped and the pattern carries its own `ESCAPE` clause.
    pub fn bind(&self, value: &SqlValue) -> Expr {
        let mut parts = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            match part {
                TemplatePart::Sql(sql) => parts.push(FragmentPart::Sql(sql.clone())),
                TemplatePart::Value => parts.push(FragmentPart::Param(value.clone())),
                TemplatePart::Contains => {
                    let pattern = format!("%{}%", escape_like(&value.to_string()));
                    parts.push(FragmentPart::Param(SqlValue::from(pattern)));
                    parts.push(FragmentPart::Sql(format!(" ESCAPE '{}'", LIKE_ESCAPE)));
                }
            }
        }
        Expr::Fragment(parts)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Escape character for `{%value%}` patterns; plain in every dialect's
/// string literals.
pub const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards (and the escape character itself) in `text`.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Filters
// =============================================================================

/// A filter definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub kind: FilterKind,
    /// Radio selectors read by page code may carry no template.
    pub template: Option<Template>,
    pub source: ValueSource,
    pub default_value: String,
    /// Choices available for this render.
    options: Vec<FilterOption>,
}

impl Filter {
    fn new(field: &str, kind: FilterKind, template: Option<&str>) -> ConfigResult<Self> {
        if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidFilter {
                field: field.to_string(),
                reason: "field keys use ASCII letters, digits and '_'".to_string(),
            });
        }
        let template = template.map(|t| Template::parse(field, t)).transpose()?;
        Ok(Self {
            field: field.to_string(),
            kind,
            template,
            source: ValueSource::None,
            default_value: String::new(),
            options: Vec::new(),
        })
    }

    /// `YYYY-MM-DD` input bound as the unix timestamp of midnight UTC.
    pub fn date(field: &str, template: &str) -> ConfigResult<Self> {
        Self::new(field, FilterKind::Date, Some(template))
    }

    pub fn text(field: &str, template: &str) -> ConfigResult<Self> {
        Self::new(field, FilterKind::Text, Some(template))
    }

    pub fn dropdown(field: &str, template: &str, source: ValueSource) -> ConfigResult<Self> {
        let mut filter = Self::new(field, FilterKind::Dropdown, Some(template))?;
        if let ValueSource::Static(options) = &source {
            filter.options = options.clone();
        }
        filter.source = source;
        Ok(filter)
    }

    /// A radio choice among fixed values.
    pub fn radio<S: AsRef<str>>(field: &str, values: &[S]) -> ConfigResult<Self> {
        let mut filter = Self::new(field, FilterKind::Radio, None)?;
        let options: Vec<FilterOption> = values
            .iter()
            .map(|v| FilterOption::new(v.as_ref(), v.as_ref()))
            .collect();
        if options.is_empty() {
            return Err(ConfigError::InvalidFilter {
                field: field.to_string(),
                reason: "radio filter declares no values".to_string(),
            });
        }
        filter.source = ValueSource::Static(options.clone());
        filter.options = options;
        Ok(filter)
    }

    /// Attach a template to a radio filter.
    pub fn with_template(mut self, template: &str) -> ConfigResult<Self> {
        self.template = Some(Template::parse(&self.field, template)?);
        Ok(self)
    }

    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = value.to_string();
        self
    }

    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    /// Sanitize a raw request/preference value.
    ///
    /// `Ok(None)` means the value is empty and the filter is inactive.
    pub fn validate(&self, raw: &str) -> Result<Option<SqlValue>, ValidationError> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(None);
        }

        match self.kind {
            FilterKind::Date => parse_date_input(value)
                .map(|ts| Some(SqlValue::Int(ts)))
                .ok_or_else(|| ValidationError::InvalidDate {
                    field: self.field.clone(),
                    value: value.to_string(),
                }),
            FilterKind::Dropdown | FilterKind::Radio => {
                if !self.options.iter().any(|o| o.id == value) {
                    return Err(ValidationError::UnknownChoice {
                        field: self.field.clone(),
                        value: value.to_string(),
                    });
                }
                Ok(Some(match value.parse::<i64>() {
                    Ok(n) if self.kind == FilterKind::Dropdown => SqlValue::Int(n),
                    _ => SqlValue::from(value),
                }))
            }
            FilterKind::Text => {
                if value.chars().any(char::is_control) {
                    return Err(ValidationError::RejectedText {
                        field: self.field.clone(),
                        reason: "control characters".to_string(),
                    });
                }
                if value.chars().count() > MAX_TEXT_LEN {
                    return Err(ValidationError::RejectedText {
                        field: self.field.clone(),
                        reason: format!("longer than {} characters", MAX_TEXT_LEN),
                    });
                }
                Ok(Some(SqlValue::from(value)))
            }
        }
    }

    /// Where-clause conjunct for a sanitized value, if the filter has a template.
    pub fn clause(&self, value: &SqlValue) -> Option<Expr> {
        self.template.as_ref().map(|t| t.bind(value))
    }
}

// =============================================================================
// FilterSet
// =============================================================================

/// Ordered set of filters for one report.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: Filter) -> ConfigResult<&mut Self> {
        if self.get(&filter.field).is_some() {
            return Err(ConfigError::DuplicateFilter(filter.field));
        }
        self.filters.push(filter);
        Ok(self)
    }

    /// Register the reserved grouping selector over the given column keys.
    pub fn add_group_by<S: AsRef<str>>(&mut self, columns: &[S]) -> ConfigResult<&mut Self> {
        let mut values = vec![GROUP_BY_NONE.to_string()];
        values.extend(columns.iter().map(|c| c.as_ref().to_string()));
        let filter = Filter::radio(GROUP_BY_FIELD, &values)?.with_default(GROUP_BY_NONE);
        self.add_filter(filter)
    }

    pub fn get(&self, field: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Grouping choices other than `none`, if a grouping selector exists.
    pub fn group_by_choices(&self) -> Vec<&str> {
        self.get(GROUP_BY_FIELD)
            .map(|f| {
                f.options
                    .iter()
                    .map(|o| o.id.as_str())
                    .filter(|id| *id != GROUP_BY_NONE)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check column references against a frozen schema.
    pub fn check_columns(&self, schema: &ColumnSchema) -> ConfigResult<()> {
        for choice in self.group_by_choices() {
            schema.require(choice, "the groupby filter")?;
        }
        Ok(())
    }

    /// Run each dropdown lookup once and cache its options for this render.
    ///
    /// Failures are returned for the caller to surface; the affected
    /// dropdown is left without options.
    pub fn load_value_sources(&mut self, source: &dyn DataSource) -> Vec<QueryError> {
        let mut errors = Vec::new();

        for filter in &mut self.filters {
            let ValueSource::Lookup(sql) = &filter.source else {
                continue;
            };

            match source.query(&Statement::raw(sql.as_str())) {
                Ok(rows) => {
                    filter.options = rows
                        .rows
                        .iter()
                        .filter_map(|row| {
                            let id = row.get("id").filter(|v| !v.is_null())?.to_string();
                            let label = row.get("label").map(ToString::to_string).unwrap_or_default();
                            let label = match row.get("label1").filter(|v| !v.is_blank()) {
                                Some(extra) => format!("{} - {}", label, extra),
                                None => label,
                            };
                            Some(FilterOption::new(id, label))
                        })
                        .collect();
                    tracing::debug!(
                        filter = %filter.field,
                        options = filter.options.len(),
                        "loaded dropdown options"
                    );
                }
                Err(err) => {
                    tracing::warn!(filter = %filter.field, error = %err, "dropdown lookup failed");
                    filter.options.clear();
                    errors.push(QueryError::Lookup {
                        field: filter.field.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        errors
    }
}
