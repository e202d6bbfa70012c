//! Integration tests for column kinds and the column schema.

use reportgrid::error::ConfigError;
use reportgrid::schema::format::{format_hourmins, parse_hourmins};
use reportgrid::schema::{ColumnKind, ColumnSchema, RawCell};
use reportgrid::sql::SqlValue;

fn render(kind: ColumnKind, value: impl Into<SqlValue>) -> String {
    kind.render(&RawCell::Value(value.into()))
}

#[test]
fn test_zero_or_absent_date_is_placeholder() {
    assert_eq!(render(ColumnKind::Date, 0i64), "---");
    assert_eq!(render(ColumnKind::Date, SqlValue::Null), "---");
    assert_eq!(render(ColumnKind::Date, ""), "---");
    assert_eq!(render(ColumnKind::Date, 1_709_510_400i64), "04-03-2024");
    assert_eq!(render(ColumnKind::Date, "2024-03-04"), "04-03-2024");
}

#[test]
fn test_hourmins_round_trips() {
    for seconds in [0, 59, 60, 900, 3599, 3600, 5400, 86_399, 360_000, -1800] {
        let text = format_hourmins(seconds);
        assert_eq!(parse_hourmins(&text), Some(seconds), "{}", text);
        assert_eq!(render(ColumnKind::Hourmins, seconds), text);
    }
}

#[test]
fn test_fullname_joins_with_one_space() {
    let cell = RawCell::Name {
        first: SqlValue::from("Ada"),
        last: SqlValue::from("Lovelace"),
    };
    assert_eq!(ColumnKind::Fullname.render(&cell), "Ada Lovelace");

    let only_last = RawCell::Name {
        first: SqlValue::Null,
        last: SqlValue::from("Lovelace"),
    };
    assert_eq!(ColumnKind::Fullname.render(&only_last), "Lovelace");
}

#[test]
fn test_price_has_currency_prefix() {
    assert_eq!(render(ColumnKind::Price, "12.50"), "$12.50");
    assert_eq!(render(ColumnKind::Price, 7i64), "$7");
    assert_eq!(render(ColumnKind::Price, SqlValue::Null), "");
}

#[test]
fn test_rendering_is_pure() {
    let kinds = [
        ColumnKind::Standard,
        ColumnKind::Date,
        ColumnKind::Price,
        ColumnKind::Hourmins,
    ];
    let values = [
        SqlValue::Null,
        SqlValue::Int(3600),
        SqlValue::Float(1.5),
        SqlValue::from("text"),
    ];
    for kind in kinds {
        for value in &values {
            let cell = RawCell::Value(value.clone());
            assert_eq!(kind.render(&cell), kind.render(&cell.clone()));
        }
    }
}

#[test]
fn test_schema_preserves_declaration_order() {
    let mut builder = ColumnSchema::builder();
    builder
        .add_column(ColumnKind::Date, "date", "timereg.date")
        .unwrap()
        .add_column(ColumnKind::Standard, "name_staff", "staff.name_staff")
        .unwrap()
        .add_column(ColumnKind::Hourmins, "time_booked", "")
        .unwrap();
    let schema = builder.build();

    assert_eq!(schema.keys(), vec!["date", "name_staff", "time_booked"]);
    assert_eq!(schema.get("time_booked").unwrap().source, "time_booked");
}

#[test]
fn test_schema_redefinition_rules() {
    let mut builder = ColumnSchema::builder();
    builder
        .add_column(ColumnKind::Standard, "description", "timereg.description")
        .unwrap();

    // identical redefinition is accepted
    assert!(builder
        .add_column(ColumnKind::Standard, "description", "timereg.description")
        .is_ok());

    let err = builder
        .add_column(ColumnKind::Price, "description", "timereg.description")
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateColumn { .. }));

    assert_eq!(builder.build().len(), 1);
}

#[test]
fn test_require_unknown_column() {
    let schema = ColumnSchema::builder().build();
    let err = schema.require("nope", "the totals").unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownColumn {
            column: "nope".into(),
            context: "the totals".into(),
        }
    );
}
