//! Integration tests for report query composition.

use reportgrid::builder::{FixedPredicate, QuerySource};
use reportgrid::options::RequestParams;
use reportgrid::preferences::MemoryPreferenceStore;
use reportgrid::report::Report;
use reportgrid::schema::{ColumnKind, Filter};
use reportgrid::sql::{Dialect, SqlValue};
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

fn report(allow: Vec<SqlValue>) -> Report {
    let source = QuerySource::new("timereg")
        .field("employeeid", "timereg.employeeid")
        .join("LEFT JOIN staff ON timereg.employeeid = staff.id")
        .join("LEFT JOIN project_phases ON timereg.phaseid = project_phases.id");

    let mut builder = Report::builder("timereg_test", source);
    builder
        .add_column(ColumnKind::Date, "date", "timereg.date")
        .unwrap()
        .add_column(ColumnKind::Standard, "name_phase", "project_phases.name_phase")
        .unwrap()
        .add_column(ColumnKind::Standard, "name_staff", "staff.name_staff")
        .unwrap()
        .add_column(ColumnKind::Standard, "description", "timereg.description")
        .unwrap()
        .add_column(ColumnKind::Standard, "time_group", "timereg.groupid")
        .unwrap()
        .add_column(ColumnKind::Hourmins, "time_booked", "timereg.time_booked")
        .unwrap()
        .add_filter(Filter::text("searchbox", "timereg.description LIKE {%value%}").unwrap())
        .unwrap()
        .add_group_by(&["name_phase", "name_staff"])
        .unwrap()
        .add_fixed_predicate(FixedPredicate::allow_list("timereg.id", allow))
        .set_totals(&["time_booked"])
        .set_defaults(&["date", "name_staff", "time_booked"], &["date"]);
    builder.build().unwrap()
}

fn resolve(report: &mut Report, query: &str) {
    let store = MemoryPreferenceStore::new();
    report.load_options(&RequestParams::from_query_string(query), &store, "jsmith");
}

fn ids(ids: &[i64]) -> Vec<SqlValue> {
    ids.iter().copied().map(SqlValue::Int).collect()
}

#[test]
fn test_group_by_staff_sums_booked_time() {
    let mut report = report(ids(&[1, 2]));
    resolve(&mut report, "filter_groupby=name_staff&order_0=date");

    let options = report.options();
    assert_eq!(options.selectable, vec!["name_staff", "time_booked"]);
    assert_eq!(options.orderable, vec!["name_staff", "time_booked"]);

    let sql = report.generate_query(Dialect::Sqlite);
    assert!(sql.contains("staff.name_staff AS \"name_staff\""), "{}", sql);
    assert!(sql.contains("SUM(timereg.time_booked) AS \"time_booked\""), "{}", sql);
    assert!(sql.contains("GROUP BY staff.name_staff"), "{}", sql);
    assert!(!sql.contains("ORDER BY"), "{}", sql);
    Parser::parse_sql(&SQLiteDialect {}, &sql).unwrap();
}

#[test]
fn test_empty_allow_list_matches_nothing() {
    let mut report = report(Vec::new());
    resolve(&mut report, "");

    let sql = report.generate_query(Dialect::Sqlite);
    assert!(sql.contains("WHERE (1 = 0)"), "{}", sql);
    Parser::parse_sql(&SQLiteDialect {}, &sql).unwrap();

    let sql = report.generate_query(Dialect::Postgres);
    Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
}

#[test]
fn test_order_capped_at_four_in_submission_order() {
    let mut report = report(ids(&[1]));
    resolve(
        &mut report,
        "table_display_options=timereg_test&date=on&description=on\
         &order_0=time_group&order_1=description&order_2=name_staff\
         &order_3=name_phase&order_4=date",
    );

    assert_eq!(
        report.options().order_columns,
        vec!["time_group", "description", "name_staff", "name_phase"]
    );
    let sql = report.generate_query(Dialect::Sqlite);
    assert!(sql.contains(
        "ORDER BY timereg.groupid ASC, timereg.description ASC, staff.name_staff ASC, project_phases.name_phase ASC"
    ), "{}", sql);
}

#[test]
fn test_no_order_columns_omit_order_by() {
    let mut report = report(ids(&[1]));
    resolve(&mut report, "table_display_options=timereg_test&date=on");
    assert!(report.options().order_columns.is_empty());
    assert!(!report.generate_query(Dialect::Sqlite).contains("ORDER BY"));
}

#[test]
fn test_empty_filter_adds_no_clause() {
    let mut report = report(ids(&[1, 2, 3]));
    resolve(&mut report, "filter_searchbox=");
    let stmt = report.statement(Dialect::Sqlite);
    assert!(!stmt.sql.contains("LIKE"), "{}", stmt.sql);
    assert_eq!(stmt.params.len(), 3);

    resolve(&mut report, "filter_searchbox=%25fix");
    let stmt = report.statement(Dialect::MySql);
    assert!(stmt.sql.contains("(timereg.description LIKE ? ESCAPE '!')"), "{}", stmt.sql);
    assert_eq!(stmt.params.last(), Some(&SqlValue::from("%!%fix%")));

    let sql = report.generate_query(Dialect::MySql);
    Parser::parse_sql(&MySqlDialect {}, &sql).unwrap();
}

#[test]
fn test_postgres_placeholders_are_numbered() {
    let mut report = report(ids(&[7, 8]));
    resolve(&mut report, "filter_searchbox=fix");
    let stmt = report.statement(Dialect::Postgres);
    assert!(stmt.sql.contains("timereg.id IN ($1, $2)"), "{}", stmt.sql);
    assert!(stmt.sql.contains("LIKE $3"), "{}", stmt.sql);
}
