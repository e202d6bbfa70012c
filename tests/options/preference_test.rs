//! Integration tests for display option priority and persistence.

use reportgrid::builder::QuerySource;
use reportgrid::options::RequestParams;
use reportgrid::preferences::{PreferenceKey, PreferenceStore, SqlitePreferenceStore};
use reportgrid::report::Report;
use reportgrid::schema::{ColumnKind, Filter};

fn report() -> Report {
    let mut builder = Report::builder("timereg_prefs", QuerySource::new("timereg"));
    builder
        .add_column(ColumnKind::Date, "date", "timereg.date")
        .unwrap()
        .add_column(ColumnKind::Standard, "description", "timereg.description")
        .unwrap()
        .add_column(ColumnKind::Hourmins, "time_booked", "timereg.time_booked")
        .unwrap()
        .add_filter(Filter::text("searchbox", "timereg.description LIKE {%value%}").unwrap())
        .unwrap()
        .set_defaults(&["date", "time_booked"], &["date"]);
    builder.build().unwrap()
}

fn render(store: &dyn PreferenceStore, query: &str) -> Report {
    let mut report = report();
    report.load_options(&RequestParams::from_query_string(query), store, "jsmith");
    report
}

#[test]
fn test_default_then_persisted_then_request() {
    let store = SqlitePreferenceStore::open_in_memory().unwrap();

    // default
    let report = render(&store, "");
    assert_eq!(report.options().selected_columns, vec!["date", "time_booked"]);

    // explicit request wins and is saved
    let report = render(
        &store,
        "table_display_options=timereg_prefs&description=on&order_0=description",
    );
    assert_eq!(report.options().selected_columns, vec!["description"]);

    // persisted beats default
    let report = render(&store, "");
    assert_eq!(report.options().selected_columns, vec!["description"]);
    assert_eq!(report.options().order_columns, vec!["description"]);

    let saved = store
        .get(&PreferenceKey::new("jsmith", "timereg_prefs"))
        .unwrap()
        .unwrap();
    assert_eq!(saved.selected_columns, vec!["description"]);
}

#[test]
fn test_empty_selection_is_valid() {
    let store = SqlitePreferenceStore::open_in_memory().unwrap();
    let report = render(&store, "table_display_options=timereg_prefs");
    assert!(report.options().selected_columns.is_empty());

    let report = render(&store, "");
    assert!(report.options().selected_columns.is_empty());
}

#[test]
fn test_filter_values_persist_until_cleared() {
    let store = SqlitePreferenceStore::open_in_memory().unwrap();

    render(&store, "filter_searchbox=invoice");
    let report = render(&store, "");
    assert_eq!(report.options().raw_filter_value("searchbox"), "invoice");
    assert!(report.statement(reportgrid::sql::Dialect::Sqlite).sql.contains("LIKE ?"));

    render(&store, "filter_searchbox=");
    let report = render(&store, "");
    assert_eq!(report.options().raw_filter_value("searchbox"), "");
    assert!(report.options().filter_value("searchbox").is_none());
}

#[test]
fn test_unknown_persisted_columns_are_dropped() {
    let store = SqlitePreferenceStore::open_in_memory().unwrap();
    let mut pref = reportgrid::preferences::DisplayPreference::default();
    pref.selected_columns = vec!["retired_column".into(), "date".into()];
    store
        .set(&PreferenceKey::new("jsmith", "timereg_prefs"), &pref)
        .unwrap();

    let report = render(&store, "");
    assert_eq!(report.options().selected_columns, vec!["date"]);
    assert_eq!(report.options().warnings.len(), 1);
}
