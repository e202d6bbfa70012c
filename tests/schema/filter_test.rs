//! Integration tests for filter sets and dropdown lookups.

use reportgrid::datasource::SqliteDataSource;
use reportgrid::error::{ConfigError, QueryError};
use reportgrid::schema::{
    ColumnKind, ColumnSchema, Filter, FilterKind, FilterOption, FilterSet, ValueSource,
};

fn lookup_source() -> SqliteDataSource {
    let source = SqliteDataSource::open_in_memory().unwrap();
    source
        .execute_batch(
            "CREATE TABLE staff (id INTEGER PRIMARY KEY, name_staff TEXT, team TEXT);
             INSERT INTO staff VALUES (2, 'Bob', NULL), (1, 'Ada', 'Design');",
        )
        .unwrap();
    source
}

#[test]
fn test_lookup_options_loaded_once_per_render() {
    let source = lookup_source();
    let mut filters = FilterSet::new();
    filters
        .add_filter(
            Filter::dropdown(
                "employeeid",
                "timereg.employeeid = {value}",
                ValueSource::Lookup(
                    "SELECT id, name_staff AS label, team AS label1 FROM staff ORDER BY name_staff"
                        .to_string(),
                ),
            )
            .unwrap(),
        )
        .unwrap();

    // not loaded yet: every value is rejected
    let employee = filters.get("employeeid").unwrap();
    assert!(employee.options().is_empty());
    assert!(employee.validate("1").is_err());

    let errors = filters.load_value_sources(&source);
    assert!(errors.is_empty());

    let employee = filters.get("employeeid").unwrap();
    assert_eq!(
        employee.options(),
        &[
            FilterOption::new("1", "Ada - Design"),
            FilterOption::new("2", "Bob"),
        ]
    );
    assert!(employee.validate("1").is_ok());
}

#[test]
fn test_failed_lookup_is_reported() {
    let source = lookup_source();
    let mut filters = FilterSet::new();
    filters
        .add_filter(
            Filter::dropdown(
                "phaseid",
                "project_phases.id = {value}",
                ValueSource::Lookup("SELECT id, name_phase AS label FROM project_phases".to_string()),
            )
            .unwrap(),
        )
        .unwrap();

    let errors = filters.load_value_sources(&source);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], QueryError::Lookup { field, .. } if field == "phaseid"));
    assert!(filters.get("phaseid").unwrap().options().is_empty());
}

#[test]
fn test_group_by_must_name_known_columns() {
    let mut builder = ColumnSchema::builder();
    builder
        .add_column(ColumnKind::Standard, "name_staff", "staff.name_staff")
        .unwrap();
    let schema = builder.build();

    let mut filters = FilterSet::new();
    filters.add_group_by(&["name_staff"]).unwrap();
    assert!(filters.check_columns(&schema).is_ok());

    let mut filters = FilterSet::new();
    filters.add_group_by(&["name_phase"]).unwrap();
    assert!(matches!(
        filters.check_columns(&schema),
        Err(ConfigError::UnknownColumn { .. })
    ));
}

#[test]
fn test_radio_filter() {
    let filter = Filter::radio("show_disabled", &["no", "yes"])
        .unwrap()
        .with_default("no");
    assert_eq!(filter.kind, FilterKind::Radio);
    assert!(filter.template.is_none());
    assert!(filter.validate("yes").unwrap().is_some());
    assert!(filter.validate("maybe").is_err());

    let empty: [&str; 0] = [];
    assert!(Filter::radio("x", &empty).is_err());
}

#[test]
fn test_invalid_field_key() {
    assert!(matches!(
        Filter::text("search box", "a LIKE {%value%}"),
        Err(ConfigError::InvalidFilter { .. })
    ));
}
