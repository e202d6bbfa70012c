//! The report façade.
//!
//! A [`Report`] bundles a frozen column schema, its filters, the query source
//! and the business-rule predicates, and walks one render through its
//! phases:
//!
//! ```text
//! load_value_sources → load_options → execute → render_interactive / render_export
//! ```
//!
//! # Example
//!
//! ```ignore
//! use reportgrid::report::Report;
//! use reportgrid::builder::QuerySource;
//! use reportgrid::schema::ColumnKind;
//!
//! let mut builder = Report::builder("staff_list", QuerySource::new("staff"));
//! builder
//!     .add_column(ColumnKind::Standard, "name_staff", "staff.name_staff")?
//!     .set_defaults(&["name_staff"], &["name_staff"]);
//! let mut report = builder.build()?;
//!
//! report.load_options(&request, &store, "jsmith");
//! let result = report.execute(&source);
//! println!("{}", report.render_interactive(&env, &result));
//! ```

use std::collections::HashSet;
use std::io::Write;

use crate::builder::{FixedPredicate, QueryBuilder, QuerySource, ID_FIELD};
use crate::datasource::DataSource;
use crate::error::{ConfigError, ConfigResult, RenderError};
use crate::options::{DisplayDefaults, OptionsResolver, RequestParams, ResolvedOptions};
use crate::preferences::{PreferenceKey, PreferenceStore};
use crate::render::{self, Link, LinkRenderer, RenderContext, Translator};
use crate::schema::{ColumnKind, ColumnSchema, ColumnSchemaBuilder, Filter, FilterSet};
use crate::sql::{Dialect, Query, Statement};
use crate::transform::{DropRule, ResultSet, ResultTransformer};

// ============================================================================
// Builder
// ============================================================================

/// Collects a report definition; [`build`](ReportBuilder::build) validates
/// cross references and freezes it.
#[derive(Debug)]
pub struct ReportBuilder {
    key: String,
    columns: ColumnSchemaBuilder,
    filters: FilterSet,
    source: QuerySource,
    fixed: Vec<FixedPredicate>,
    totals: Vec<String>,
    defaults: DisplayDefaults,
}

impl ReportBuilder {
    pub fn add_column(&mut self, kind: ColumnKind, key: &str, source: &str) -> ConfigResult<&mut Self> {
        self.columns.add_column(kind, key, source)?;
        Ok(self)
    }

    pub fn add_filter(&mut self, filter: Filter) -> ConfigResult<&mut Self> {
        self.filters.add_filter(filter)?;
        Ok(self)
    }

    /// Offer grouping by any of the given columns.
    pub fn add_group_by<S: AsRef<str>>(&mut self, columns: &[S]) -> ConfigResult<&mut Self> {
        self.filters.add_group_by(columns)?;
        Ok(self)
    }

    pub fn add_fixed_predicate(&mut self, predicate: FixedPredicate) -> &mut Self {
        self.fixed.push(predicate);
        self
    }

    /// Columns summed in the totals row and in aggregation mode.
    pub fn set_totals<S: AsRef<str>>(&mut self, columns: &[S]) -> &mut Self {
        self.totals = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Columns and order used when nothing was requested or persisted.
    pub fn set_defaults<S: AsRef<str>>(&mut self, columns: &[S], order: &[S]) -> &mut Self {
        self.defaults.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self.defaults.order = order.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Restrict the order selectors to these columns.
    pub fn set_orderable<S: AsRef<str>>(&mut self, columns: &[S]) -> &mut Self {
        self.defaults.orderable = Some(columns.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn build(self) -> ConfigResult<Report> {
        let schema = self.columns.build();

        self.filters.check_columns(&schema)?;

        for key in &self.totals {
            let column = schema.require(key, "the totals")?;
            if !column.kind.is_summable() {
                return Err(ConfigError::NotSummable(key.clone()));
            }
        }
        for key in self.defaults.columns.iter().chain(&self.defaults.order) {
            schema.require(key, "the display defaults")?;
        }
        for key in self.defaults.orderable.iter().flatten() {
            schema.require(key, "the orderable columns")?;
        }

        // every fetched field lands in one row map keyed by its alias
        let mut fields = HashSet::from([ID_FIELD.to_string()]);
        let column_fields = schema.iter().flat_map(|c| c.field_names());
        let passthrough = self.source.passthrough.iter().map(|(alias, _)| alias.clone());
        for field in column_fields.chain(passthrough) {
            if !fields.insert(field.clone()) {
                return Err(ConfigError::DuplicateField(field));
            }
        }

        tracing::debug!(
            report = %self.key,
            columns = schema.len(),
            fixed = self.fixed.len(),
            "report defined"
        );

        Ok(Report {
            key: self.key,
            schema,
            filters: self.filters,
            source: self.source,
            fixed: self.fixed,
            totals: self.totals,
            defaults: self.defaults,
            links: Vec::new(),
            drop_rules: Vec::new(),
            options: ResolvedOptions::default(),
            diagnostics: Vec::new(),
        })
    }
}

// ============================================================================
// Report
// ============================================================================

/// Page-level inputs to the renderers.
#[derive(Clone, Copy)]
pub struct RenderEnv<'a> {
    pub page: &'a str,
    pub language: &'a str,
    pub translator: &'a dyn Translator,
    pub link_renderer: &'a dyn LinkRenderer,
}

/// A defined report and the state of its current render.
#[derive(Debug)]
pub struct Report {
    key: String,
    schema: ColumnSchema,
    filters: FilterSet,
    source: QuerySource,
    fixed: Vec<FixedPredicate>,
    totals: Vec<String>,
    defaults: DisplayDefaults,
    links: Vec<Link>,
    drop_rules: Vec<DropRule>,
    options: ResolvedOptions,
    diagnostics: Vec<String>,
}

impl Report {
    /// Start defining a report. `key` names it in the preference store.
    pub fn builder(key: &str, source: QuerySource) -> ReportBuilder {
        ReportBuilder {
            key: key.to_string(),
            columns: ColumnSchema::builder(),
            filters: FilterSet::new(),
            source,
            fixed: Vec::new(),
            totals: Vec::new(),
            defaults: DisplayDefaults::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn totals(&self) -> &[String] {
        &self.totals
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Options of the current render; defaults until
    /// [`load_options`](Report::load_options) runs.
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Failures recovered during this render, shown above the table.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn add_link(&mut self, link: Link) -> ConfigResult<&mut Self> {
        if let Some(column) = &link.column {
            self.schema.require(column, &format!("link '{}'", link.name))?;
        }
        self.links.push(link);
        Ok(self)
    }

    /// Record a failure recovered by page code.
    pub fn add_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    /// Add a predicate once the mode of this render is known.
    pub fn add_fixed_predicate(&mut self, predicate: FixedPredicate) -> &mut Self {
        self.fixed.push(predicate);
        self
    }

    pub fn add_drop_rule(&mut self, rule: DropRule) -> &mut Self {
        self.drop_rules.push(rule);
        self
    }

    /// Run the dropdown lookups for this render.
    pub fn load_value_sources(&mut self, source: &dyn DataSource) {
        for err in self.filters.load_value_sources(source) {
            self.diagnostics.push(err.to_string());
        }
    }

    /// Resolve display options from the request and the user's saved
    /// preference, then save the result back when it changed.
    ///
    /// Store failures are logged and never fail the render.
    pub fn load_options(
        &mut self,
        request: &RequestParams,
        store: &dyn PreferenceStore,
        user: &str,
    ) -> &ResolvedOptions {
        let key = PreferenceKey::new(user, self.key.as_str());

        let persisted = store.get(&key).unwrap_or_else(|err| {
            tracing::warn!(key = %key, error = %err, "failed to load display preference");
            None
        });

        let resolved = OptionsResolver {
            schema: &self.schema,
            filters: &self.filters,
            defaults: &self.defaults,
            totals: &self.totals,
        }
        .resolve(request, persisted.as_ref());

        if resolved.persist {
            if let Err(err) = store.set(&key, &resolved.preference) {
                tracing::warn!(key = %key, error = %err, "failed to save display preference");
            }
        }

        self.options = resolved;
        &self.options
    }

    /// The query for the current options.
    pub fn query(&self) -> Query {
        QueryBuilder {
            schema: &self.schema,
            filters: &self.filters,
            source: &self.source,
            fixed: &self.fixed,
            totals: &self.totals,
        }
        .build(&self.options)
    }

    /// Display SQL with values inlined.
    pub fn generate_query(&self, dialect: Dialect) -> String {
        self.query().to_sql(dialect)
    }

    pub fn statement(&self, dialect: Dialect) -> Statement {
        self.query().to_statement(dialect)
    }

    /// Fetch, transform, drop and total.
    ///
    /// A failing query is recorded as a diagnostic and yields an empty set.
    pub fn execute(&mut self, source: &dyn DataSource) -> ResultSet {
        let statement = self.statement(source.dialect());
        tracing::debug!(
            report = %self.key,
            sql = %statement.sql,
            params = statement.params.len(),
            "executing report query"
        );

        let rowset = match source.query(&statement) {
            Ok(rowset) => rowset,
            Err(err) => {
                tracing::warn!(report = %self.key, error = %err, "report query failed");
                self.diagnostics.push(err.to_string());
                return ResultSet::default();
            }
        };

        let passthrough: Vec<String> = self
            .source
            .passthrough
            .iter()
            .map(|(alias, _)| alias.clone())
            .collect();

        let result = ResultTransformer {
            schema: &self.schema,
            passthrough: &passthrough,
        }
        .transform(&rowset)
        .without(&self.drop_rules)
        .with_totals(&self.schema, &self.totals);

        tracing::info!(
            report = %self.key,
            fetched = result.fetched_count(),
            rows = result.len(),
            "report executed"
        );
        result
    }

    fn context<'a>(&'a self, env: &RenderEnv<'a>) -> RenderContext<'a> {
        RenderContext {
            report: &self.key,
            page: env.page,
            language: env.language,
            schema: &self.schema,
            filters: &self.filters,
            options: &self.options,
            links: &self.links,
            diagnostics: &self.diagnostics,
            translator: env.translator,
            link_renderer: env.link_renderer,
        }
    }

    pub fn render_interactive(&self, env: &RenderEnv<'_>, result: &ResultSet) -> String {
        render::html::render_interactive(&self.context(env), result)
    }

    pub fn render_export<W: Write>(
        &self,
        env: &RenderEnv<'_>,
        result: &ResultSet,
        delimiter: u8,
        out: W,
    ) -> Result<(), RenderError> {
        render::csv::render_export(&self.context(env), result, delimiter, out)
    }
}
