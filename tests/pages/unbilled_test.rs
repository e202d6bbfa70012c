//! End-to-end tests for the unbilled time page against the in-memory fixture.

#[path = "../common/mod.rs"]
mod common;

use common::fixture;
use reportgrid::options::RequestParams;
use reportgrid::pages::{self, ReportPage, UnbilledTime};
use reportgrid::preferences::MemoryPreferenceStore;
use reportgrid::render::{HumanizeTranslator, QueryStringLinks};
use reportgrid::report::{RenderEnv, Report};
use reportgrid::sql::{Dialect, SqlValue};
use reportgrid::transform::ResultSet;

fn run(request: &str) -> (Report, ResultSet) {
    let source = fixture();
    let store = MemoryPreferenceStore::new();
    let request = RequestParams::from_query_string(request);
    pages::run(&UnbilledTime, &source, &store, "jsmith", &request).unwrap()
}

fn export(report: &Report, result: &ResultSet) -> Vec<String> {
    let translator = HumanizeTranslator;
    let links = QueryStringLinks::default();
    let env = RenderEnv {
        page: UnbilledTime.path(),
        language: "en_us",
        translator: &translator,
        link_renderer: &links,
    };
    let mut out = Vec::new();
    report.render_export(&env, result, b',', &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn ids(result: &ResultSet) -> Vec<i64> {
    result.iter().filter_map(|r| r.id.as_i64()).collect()
}

#[test]
fn test_eligible_ids_skip_invoiced_groups() {
    let source = fixture();
    let ids = UnbilledTime::eligible_ids(&source).unwrap();
    assert_eq!(
        ids,
        vec![1, 2, 3, 5, 6].into_iter().map(SqlValue::Int).collect::<Vec<_>>()
    );
}

#[test]
fn test_default_export() {
    let (report, result) = run("");

    assert_eq!(ids(&result), vec![1, 2, 3, 5, 6]);

    let lines = export(&report, &result);
    assert_eq!(
        lines[0],
        "Date,Name Phase,Name Staff,Time Group,Description,Time Booked"
    );
    assert_eq!(lines[1], "04-03-2024,Apollo -- Design,Ada Lovelace,,Wireframes,1:00");
    assert_eq!(lines[3], "05-03-2024,Apollo -- Build,Ada Lovelace,March batch,Prototype build,0:30");
    assert_eq!(lines.len(), 6);
}

#[test]
fn test_rows_invoiced_after_pre_query_are_dropped() {
    let source = fixture();
    let store = MemoryPreferenceStore::new();
    let request = RequestParams::default();
    let page = UnbilledTime;

    let mut report = page.build(&source, &request).unwrap();
    source
        .execute_batch("UPDATE time_groups SET invoiceid = 14 WHERE id = 3")
        .unwrap();
    report.load_value_sources(&source);
    report.load_options(&request, &store, "jsmith");
    page.after_options(&mut report).unwrap();
    let result = report.execute(&source);

    assert_eq!(result.fetched_count(), 5);
    assert_eq!(result.len(), 4);
    assert_eq!(ids(&result), vec![1, 2, 3, 5]);
    assert_eq!(export(&report, &result).len(), 1 + 4);
}

#[test]
fn test_grouped_rows_exclude_entries_invoiced_after_pre_query() {
    let source = fixture();
    let store = MemoryPreferenceStore::new();
    let request = RequestParams::from_query_string("filter_groupby=name_staff");
    let page = UnbilledTime;

    let mut report = page.build(&source, &request).unwrap();
    source
        .execute_batch("UPDATE time_groups SET invoiceid = 14 WHERE id = 3")
        .unwrap();
    report.load_value_sources(&source);
    report.load_options(&request, &store, "jsmith");
    page.after_options(&mut report).unwrap();
    let result = report.execute(&source);

    let mut rows: Vec<(String, String)> = result
        .iter()
        .map(|r| {
            (
                r.display("name_staff").to_string(),
                r.display("time_booked").to_string(),
            )
        })
        .collect();
    rows.sort();
    // Bob keeps his ungrouped 1:30; only the newly invoiced 0:45 is gone
    assert_eq!(
        rows,
        vec![
            ("Ada Lovelace".to_string(), "1:45".to_string()),
            ("Bob Smith".to_string(), "1:30".to_string()),
        ]
    );
    assert_eq!(result.total("time_booked").unwrap().display, "3:15");
}

#[test]
fn test_large_allow_list() {
    let source = fixture();
    source
        .execute_batch(&format!(
            "WITH RECURSIVE n(i) AS (SELECT 100 UNION ALL SELECT i + 1 FROM n WHERE i < 5099)
             INSERT INTO timereg SELECT i, {}, 1, 1, 0, 'Bulk entry', 60 FROM n;",
            common::MAR_04 + 3 * common::DAY
        ))
        .unwrap();

    let store = MemoryPreferenceStore::new();
    let (report, result) =
        pages::run(&UnbilledTime, &source, &store, "jsmith", &RequestParams::default()).unwrap();

    assert!(report.diagnostics().is_empty(), "{:?}", report.diagnostics());
    assert_eq!(result.len(), 5 + 5000);
    assert_eq!(result.total("time_booked").unwrap().display, "87:20");
}

#[test]
fn test_group_by_staff() {
    let (report, result) = run("filter_groupby=name_staff");
    let options = report.options();

    assert_eq!(options.group_by.as_deref(), Some("name_staff"));
    assert_eq!(options.selectable, vec!["name_staff", "time_booked"]);
    assert_eq!(options.orderable, vec!["name_staff", "time_booked"]);
    assert_eq!(options.selected_columns, vec!["name_staff", "time_booked"]);
    assert!(options.order_columns.is_empty());

    let sql = report.generate_query(Dialect::Sqlite);
    assert!(sql.contains("SUM(timereg.time_booked) AS \"time_booked\""), "{}", sql);
    assert!(sql.contains("GROUP BY staff.name_staff"), "{}", sql);
    assert!(!sql.contains("ORDER BY"), "{}", sql);

    let mut rows: Vec<(String, String)> = result
        .iter()
        .map(|r| {
            (
                r.display("name_staff").to_string(),
                r.display("time_booked").to_string(),
            )
        })
        .collect();
    rows.sort();
    assert_eq!(
        rows,
        vec![
            ("Ada Lovelace".to_string(), "1:45".to_string()),
            ("Bob Smith".to_string(), "2:15".to_string()),
        ]
    );
    assert_eq!(result.total("time_booked").unwrap().display, "4:00");

    // no per-entry editor link on grouped rows
    assert!(report
        .links()
        .iter()
        .all(|l| l.name != "tbl_lnk_view_timeentry"));
}

#[test]
fn test_filters_narrow_rows() {
    let (report, result) = run("filter_date_start=2024-03-05&filter_employeeid=1");
    assert_eq!(ids(&result), vec![3, 5]);

    let phases = report.filters().get("phaseid").unwrap().options();
    assert!(phases
        .iter()
        .any(|o| o.id == "2" && o.label == "Apollo - Build"));

    let (_, result) = run("filter_date_end=2024-03-04");
    assert_eq!(ids(&result), vec![1, 2]);

    let (_, result) = run("filter_searchbox=visit");
    assert_eq!(ids(&result), vec![2]);
}

#[test]
fn test_search_treats_wildcards_literally() {
    let source = fixture();
    source
        .execute_batch(
            "INSERT INTO timereg VALUES
                (7, 0, 1, 1, 0, 'Paid 50% deposit', 60),
                (8, 0, 1, 1, 0, 'Paid 500 deposit', 60),
                (9, 0, 1, 1, 0, 'Paid 5_0 deposit', 60);",
        )
        .unwrap();
    let store = MemoryPreferenceStore::new();

    let request = RequestParams::from_query_string("filter_searchbox=50%25");
    let (_, result) = pages::run(&UnbilledTime, &source, &store, "jsmith", &request).unwrap();
    assert_eq!(ids(&result), vec![7]);

    let request = RequestParams::from_query_string("filter_searchbox=5_0");
    let (_, result) = pages::run(&UnbilledTime, &source, &store, "mjones", &request).unwrap();
    assert_eq!(ids(&result), vec![9]);
}

#[test]
fn test_unknown_dropdown_value_is_ignored() {
    let (report, result) = run("filter_employeeid=99");
    assert_eq!(report.options().warnings.len(), 1);
    assert_eq!(result.len(), 5);
}

#[test]
fn test_preferences_carry_over() {
    let source = fixture();
    let store = MemoryPreferenceStore::new();

    let submitted = RequestParams::from_query_string(
        "table_display_options=timereg_unbilled&description=on&time_booked=on&order_0=description",
    );
    let (report, _) = pages::run(&UnbilledTime, &source, &store, "jsmith", &submitted).unwrap();
    assert_eq!(report.options().selected_columns, vec!["description", "time_booked"]);

    let (report, result) =
        pages::run(&UnbilledTime, &source, &store, "jsmith", &RequestParams::default()).unwrap();
    assert_eq!(report.options().selected_columns, vec!["description", "time_booked"]);
    assert_eq!(report.options().order_columns, vec!["description"]);
    assert_eq!(result.rows()[0].display("description"), "Prototype build");

    // another user still gets the defaults
    let (report, _) =
        pages::run(&UnbilledTime, &source, &store, "mjones", &RequestParams::default()).unwrap();
    assert_eq!(report.options().selected_columns.len(), 6);
}

#[test]
fn test_interactive_links() {
    let (report, result) = run("");
    let translator = HumanizeTranslator;
    let links = QueryStringLinks::default();
    let env = RenderEnv {
        page: UnbilledTime.path(),
        language: "en_us",
        translator: &translator,
        link_renderer: &links,
    };
    let html = report.render_interactive(&env, &result);

    assert!(html.contains(
        "<a href=\"index.php?page=projects%2Ftimebooked.php&amp;id=1\">Apollo -- Design</a>"
    ));
    assert!(html.contains("timekeeping%2Ftimereg-day-edit.php&amp;id=1&amp;date=1709510400&amp;employeeid=1"));
    assert!(html.contains("<b>Total:</b>"));
}
