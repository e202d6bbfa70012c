//! Report pages: concrete reports built on the engine.
//!
//! A page defines its report from the request (fixed predicates often need
//! a pre-query), then gets a second look once options are resolved to add
//! mode-dependent links and drop rules.

mod services;
mod unbilled;

pub use services::CustomerServices;
pub use unbilled::UnbilledTime;

use crate::datasource::DataSource;
use crate::error::{ReportError, ReportResult};
use crate::options::RequestParams;
use crate::preferences::PreferenceStore;
use crate::report::Report;
use crate::transform::ResultSet;

pub trait ReportPage {
    /// Short name used on the command line.
    fn name(&self) -> &'static str;

    /// Page path, echoed by the options form and used by links.
    fn path(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn build(&self, source: &dyn DataSource, request: &RequestParams) -> ReportResult<Report>;

    /// Adjust the report once display options are known.
    fn after_options(&self, _report: &mut Report) -> ReportResult<()> {
        Ok(())
    }
}

/// Every registered page.
pub fn all() -> Vec<Box<dyn ReportPage>> {
    vec![Box::new(UnbilledTime), Box::new(CustomerServices)]
}

/// Look a page up by short name or path.
pub fn find(name: &str) -> ReportResult<Box<dyn ReportPage>> {
    all()
        .into_iter()
        .find(|page| page.name() == name || page.path() == name)
        .ok_or_else(|| ReportError::UnknownPage(name.to_string()))
}

/// Build, resolve and execute a page for one user.
pub fn run(
    page: &dyn ReportPage,
    source: &dyn DataSource,
    store: &dyn PreferenceStore,
    user: &str,
    request: &RequestParams,
) -> ReportResult<(Report, ResultSet)> {
    let span = tracing::info_span!("page", name = page.name(), user);
    let _enter = span.enter();

    let mut report = page.build(source, request)?;
    report.load_value_sources(source);
    report.load_options(request, store, user);
    page.after_options(&mut report)?;
    let result = report.execute(source);
    Ok((report, result))
}
