//! Display options resolution.
//!
//! Options are resolved in two phases:
//!
//! 1. **Grouping.** The `groupby` selector is resolved first (request, then
//!    persisted preference, then its default). A grouping column switches the
//!    report into aggregation mode and narrows the column and order domain to
//!    the grouping key plus the totals columns.
//! 2. **Columns, order and filters**, resolved against the narrowed domain
//!    with the same priority: explicit request > persisted > declared default.
//!
//! Invalid request input never fails resolution. It is logged, recorded as a
//! [`ValidationError`] warning, and the offending value is dropped.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::error::ValidationError;
use crate::preferences::DisplayPreference;
use crate::schema::{ColumnSchema, FilterSet, GROUP_BY_FIELD, GROUP_BY_NONE};
use crate::sql::SqlValue;

/// Most columns a report may be ordered by.
pub const MAX_ORDER_COLUMNS: usize = 4;

/// Query parameter flagging a submitted options form.
pub const SUBMITTED_FLAG: &str = "table_display_options";

const ORDER_PREFIX: &str = "order_";
const FILTER_PREFIX: &str = "filter_";

// =============================================================================
// Request parameters
// =============================================================================

/// Display options carried by one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    /// The options form was submitted; column choices are explicit.
    pub submitted: bool,
    /// Columns ticked on the form (`<key>=on`), in submission order.
    pub columns: Vec<String>,
    /// Order selectors (`order_<i>`), by index.
    pub order: Vec<String>,
    /// Filter inputs (`filter_<field>`), present even when empty.
    pub filters: BTreeMap<String, String>,
    /// Any other parameter, such as `page` or a record id read by page code.
    pub values: BTreeMap<String, String>,
}

impl RequestParams {
    /// Build from decoded query pairs.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = RequestParams::default();
        let mut order: Vec<(usize, String)> = Vec::new();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());

            if key == SUBMITTED_FLAG {
                params.submitted = true;
            } else if let Some(field) = key.strip_prefix(FILTER_PREFIX) {
                params.filters.insert(field.to_string(), value.to_string());
            } else if let Some(index) = key
                .strip_prefix(ORDER_PREFIX)
                .and_then(|i| i.parse::<usize>().ok())
            {
                if !value.trim().is_empty() {
                    order.push((index, value.trim().to_string()));
                }
            } else if value == "on" {
                if !params.columns.iter().any(|c| c == key) {
                    params.columns.push(key.to_string());
                }
            } else {
                params.values.insert(key.to_string(), value.to_string());
            }
        }

        order.sort_by_key(|(index, _)| *index);
        params.order = order.into_iter().map(|(_, column)| column).collect();
        params
    }

    /// Parse a raw `a=b&c=d` query string, percent-decoding keys and values.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_query_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether any filter input arrived with this request.
    pub fn has_filter_values(&self) -> bool {
        !self.filters.is_empty()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Display defaults declared by report code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayDefaults {
    pub columns: Vec<String>,
    pub order: Vec<String>,
    /// Columns offered for ordering; all schema columns when `None`.
    pub orderable: Option<Vec<String>>,
}

/// Effective options for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    /// Grouping column in aggregation mode.
    pub group_by: Option<String>,
    /// Columns to fetch and display, in display order.
    pub selected_columns: Vec<String>,
    /// Sort columns, in submission order. Always empty in aggregation mode.
    pub order_columns: Vec<String>,
    /// Columns that may be selected in this mode.
    pub selectable: Vec<String>,
    /// Columns that may be ordered by in this mode.
    pub orderable: Vec<String>,
    /// Sanitized values of the active filters.
    pub filter_values: BTreeMap<String, SqlValue>,
    /// What to persist: the user's un-narrowed choices.
    pub preference: DisplayPreference,
    /// Whether the preference should be written back.
    pub persist: bool,
    /// Rejected inputs.
    pub warnings: Vec<ValidationError>,
}

impl ResolvedOptions {
    pub fn is_aggregated(&self) -> bool {
        self.group_by.is_some()
    }

    pub fn filter_value(&self, field: &str) -> Option<&SqlValue> {
        self.filter_values.get(field)
    }

    /// The raw value shown back in a filter's input.
    pub fn raw_filter_value(&self, field: &str) -> &str {
        if field == GROUP_BY_FIELD {
            return self.group_by.as_deref().unwrap_or(GROUP_BY_NONE);
        }
        self.preference
            .filter_values
            .get(field)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Resolves request and persisted options against a report definition.
#[derive(Debug, Clone, Copy)]
pub struct OptionsResolver<'a> {
    pub schema: &'a ColumnSchema,
    pub filters: &'a FilterSet,
    pub defaults: &'a DisplayDefaults,
    /// Columns summed in aggregation mode.
    pub totals: &'a [String],
}

impl OptionsResolver<'_> {
    pub fn resolve(
        &self,
        request: &RequestParams,
        persisted: Option<&DisplayPreference>,
    ) -> ResolvedOptions {
        let mut warnings = Vec::new();

        // Phase 1: grouping
        let group_by = self.resolve_group_by(request, persisted, &mut warnings);

        // Phase 2: domain, then columns/order/filters within it
        let (selectable, orderable) = match &group_by {
            Some(key) => {
                let domain = self.aggregate_domain(key);
                (domain.clone(), domain)
            }
            None => (
                self.schema.keys(),
                self.defaults
                    .orderable
                    .clone()
                    .unwrap_or_else(|| self.schema.keys()),
            ),
        };

        let chosen_columns: Vec<String> = if request.submitted {
            self.known_columns(&request.columns, &mut warnings)
        } else if let Some(pref) = persisted {
            self.known_columns(&pref.selected_columns, &mut warnings)
        } else {
            self.defaults.columns.clone()
        };

        let order_source: &[String] = if request.submitted {
            &request.order
        } else if let Some(pref) = persisted {
            &pref.order_columns
        } else {
            &self.defaults.order
        };
        let chosen_order = self.cap_order(order_source, &mut warnings);

        let (selected_columns, order_columns) = if group_by.is_some() {
            (selectable.clone(), Vec::new())
        } else {
            let order = chosen_order
                .iter()
                .filter(|c| orderable.contains(c))
                .cloned()
                .collect();
            (chosen_columns.clone(), order)
        };

        let (filter_values, raw_values) = self.resolve_filters(request, persisted, &mut warnings);

        let persist = request.submitted || persisted.is_none() || request.has_filter_values();

        ResolvedOptions {
            preference: DisplayPreference {
                selected_columns: chosen_columns,
                order_columns: chosen_order,
                group_by: group_by.clone(),
                filter_values: raw_values,
            },
            group_by,
            selected_columns,
            order_columns,
            selectable,
            orderable,
            filter_values,
            persist,
            warnings,
        }
    }

    fn resolve_group_by(
        &self,
        request: &RequestParams,
        persisted: Option<&DisplayPreference>,
        warnings: &mut Vec<ValidationError>,
    ) -> Option<String> {
        let filter = self.filters.get(GROUP_BY_FIELD)?;

        let raw = match request.filters.get(GROUP_BY_FIELD) {
            Some(value) => value.clone(),
            None => match persisted {
                Some(pref) => pref
                    .group_by
                    .clone()
                    .unwrap_or_else(|| GROUP_BY_NONE.to_string()),
                None => filter.default_value.clone(),
            },
        };

        let value = match filter.validate(&raw) {
            Ok(Some(value)) => value.to_string(),
            Ok(None) => filter.default_value.clone(),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring grouping selection");
                warnings.push(err);
                filter.default_value.clone()
            }
        };

        (value != GROUP_BY_NONE && self.schema.contains(&value)).then_some(value)
    }

    /// The grouping key followed by the totals columns.
    fn aggregate_domain(&self, key: &str) -> Vec<String> {
        let mut domain = vec![key.to_string()];
        domain.extend(self.totals.iter().filter(|t| t.as_str() != key).cloned());
        domain
    }

    fn known_columns(&self, columns: &[String], warnings: &mut Vec<ValidationError>) -> Vec<String> {
        let mut known: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            if !self.schema.contains(column) {
                let err = ValidationError::UnknownColumn(column.clone());
                tracing::warn!(error = %err, "dropping column from display options");
                warnings.push(err);
            } else if !known.contains(column) {
                known.push(column.clone());
            }
        }
        known
    }

    fn cap_order(&self, order: &[String], warnings: &mut Vec<ValidationError>) -> Vec<String> {
        let mut known = self.known_columns(order, warnings);
        known.truncate(MAX_ORDER_COLUMNS);
        known
    }

    /// Sanitized active values, plus the raw strings worth persisting.
    fn resolve_filters(
        &self,
        request: &RequestParams,
        persisted: Option<&DisplayPreference>,
        warnings: &mut Vec<ValidationError>,
    ) -> (BTreeMap<String, SqlValue>, BTreeMap<String, String>) {
        let mut active = BTreeMap::new();
        let mut raw_values = BTreeMap::new();

        for filter in self.filters.iter().filter(|f| f.field != GROUP_BY_FIELD) {
            let raw = request
                .filters
                .get(&filter.field)
                .or_else(|| persisted.and_then(|p| p.filter_values.get(&filter.field)))
                .cloned()
                .unwrap_or_else(|| filter.default_value.clone());

            match filter.validate(&raw) {
                Ok(Some(value)) => {
                    raw_values.insert(filter.field.clone(), raw.trim().to_string());
                    active.insert(filter.field.clone(), value);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring filter value");
                    warnings.push(err);
                }
            }
        }

        (active, raw_values)
    }
}
