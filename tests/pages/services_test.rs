//! Tests for the customer services page.

#[path = "../common/mod.rs"]
mod common;

use common::fixture;
use reportgrid::error::ReportError;
use reportgrid::options::RequestParams;
use reportgrid::pages::{self, CustomerServices};
use reportgrid::preferences::MemoryPreferenceStore;
use reportgrid::report::Report;
use reportgrid::sql::Dialect;
use reportgrid::transform::ResultSet;

fn run(request: &str) -> Result<(Report, ResultSet), ReportError> {
    let source = fixture();
    let store = MemoryPreferenceStore::new();
    let request = RequestParams::from_query_string(request);
    pages::run(&CustomerServices, &source, &store, "jsmith", &request)
}

fn names(result: &ResultSet) -> Vec<&str> {
    result.iter().map(|r| r.display("name_service")).collect()
}

#[test]
fn test_requires_customer_id() {
    assert!(matches!(run(""), Err(ReportError::InvalidParam { .. })));
    assert!(matches!(run("customerid=abc"), Err(ReportError::InvalidParam { .. })));
}

#[test]
fn test_only_this_customers_active_services() {
    let (report, result) = run("customerid=12").unwrap();

    let statement = report.statement(Dialect::Sqlite);
    assert!(statement.sql.contains("services_customers.customerid = ?"));
    assert_eq!(statement.params.first().and_then(|v| v.as_i64()), Some(12));

    assert_eq!(result.fetched_count(), 3);
    assert_eq!(names(&result), vec!["Hosting", "Support"]);
    assert_eq!(result.rows()[0].display("price"), "$25.00");
    assert_eq!(result.rows()[0].display("date_period_next"), "01-04-2024");
    assert_eq!(result.total("price").unwrap().display, "$120");
}

#[test]
fn test_show_disabled_keeps_every_row() {
    let (_, result) = run("customerid=12&filter_show_disabled=yes").unwrap();
    assert_eq!(names(&result), vec!["Backups", "Hosting", "Support"]);
    assert_eq!(result.total("price").unwrap().display, "$130.5");
}

#[test]
fn test_searchbox() {
    let (_, result) = run("customerid=12&filter_searchbox=premium").unwrap();
    assert_eq!(names(&result), vec!["Support"]);
}
