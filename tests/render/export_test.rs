//! Integration tests for delimited export.

#[path = "../common/mod.rs"]
mod common;

use common::fixture;
use reportgrid::config::Settings;
use reportgrid::options::RequestParams;
use reportgrid::pages::{self, ReportPage, UnbilledTime};
use reportgrid::preferences::MemoryPreferenceStore;
use reportgrid::render::{MapTranslator, QueryStringLinks, EMPTY_MESSAGE};
use reportgrid::report::{RenderEnv, Report};
use reportgrid::transform::ResultSet;

const CONFIG: &str = r#"
[render]
csv_delimiter = ";"

[labels.en_us]
date = "Date"
name_staff = "Employee"
time_booked = "Time Booked"
description = "Description"
"#;

fn export(settings: &Settings, report: &Report, result: &ResultSet) -> String {
    let translator = MapTranslator::from_settings(settings);
    let links = QueryStringLinks::new(&settings.render.page_base);
    let env = RenderEnv {
        page: UnbilledTime.path(),
        language: &settings.render.language,
        translator: &translator,
        link_renderer: &links,
    };
    let mut out = Vec::new();
    report
        .render_export(&env, result, settings.render.delimiter_byte().unwrap(), &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn run(query: &str) -> (Report, ResultSet) {
    let source = fixture();
    let store = MemoryPreferenceStore::new();
    pages::run(
        &UnbilledTime,
        &source,
        &store,
        "jsmith",
        &RequestParams::from_query_string(query),
    )
    .unwrap()
}

#[test]
fn test_header_follows_preference_order() {
    let settings = Settings::from_toml(CONFIG).unwrap();
    let (report, result) = run(
        "table_display_options=timereg_unbilled&time_booked=on&name_staff=on&date=on&order_0=date",
    );

    let text = export(&settings, &report, &result);
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Time Booked;Employee;Date"));
    assert_eq!(lines.next(), Some("1:00;Ada Lovelace;04-03-2024"));
    assert_eq!(text.lines().count(), 1 + result.len());
}

#[test]
fn test_export_has_no_links_or_totals() {
    let settings = Settings::from_toml(CONFIG).unwrap();
    let (report, result) = run("");
    let text = export(&settings, &report, &result);
    assert!(!text.contains("href"));
    assert!(!text.contains("Total"));
    // untranslated keys fall back to the key
    assert!(text.starts_with("Date;name_phase;Employee;time_group;Description;Time Booked"));
}

#[test]
fn test_fields_are_quoted_when_needed() {
    let settings = Settings::from_toml("[render]\ncsv_delimiter = \" \"\n").unwrap();
    let (report, result) = run(
        "table_display_options=timereg_unbilled&description=on&filter_searchbox=site",
    );
    let text = export(&settings, &report, &result);
    assert_eq!(text, "description\n\"Site visit\"\n");
}

#[test]
fn test_empty_result_is_single_message() {
    let settings = Settings::default();
    let (report, result) = run("filter_searchbox=no+such+entry");
    assert!(result.is_empty());
    let text = export(&settings, &report, &result);
    assert_eq!(text, format!("{}\n", EMPTY_MESSAGE));
}
