//! Shared in-memory database fixture for integration tests.

#![allow(dead_code)]

use reportgrid::datasource::SqliteDataSource;

/// 2024-03-04 00:00:00 UTC
pub const MAR_04: i64 = 1_709_510_400;
pub const DAY: i64 = 86_400;

const SCHEMA: &str = "
CREATE TABLE staff (id INTEGER PRIMARY KEY, name_staff TEXT);
CREATE TABLE projects (id INTEGER PRIMARY KEY, name_project TEXT);
CREATE TABLE project_phases (id INTEGER PRIMARY KEY, projectid INTEGER, name_phase TEXT);
CREATE TABLE time_groups (id INTEGER PRIMARY KEY, projectid INTEGER, name_group TEXT, invoiceid INTEGER);
CREATE TABLE timereg (
    id INTEGER PRIMARY KEY,
    date INTEGER,
    employeeid INTEGER,
    phaseid INTEGER,
    groupid INTEGER,
    description TEXT,
    time_booked INTEGER
);
CREATE TABLE services (id INTEGER PRIMARY KEY, name_service TEXT, price TEXT);
CREATE TABLE services_customers (
    id INTEGER PRIMARY KEY,
    customerid INTEGER,
    serviceid INTEGER,
    description TEXT,
    date_period_first INTEGER,
    date_period_next INTEGER,
    active INTEGER
);
";

/// Time entries:
///
/// | id | day    | staff | phase            | group          | booked |
/// |----|--------|-------|------------------|----------------|--------|
/// | 1  | Mar 04 | Ada   | Apollo/Design    | -              | 1:00   |
/// | 2  | Mar 04 | Bob   | Borealis/Survey  | -              | 1:30   |
/// | 3  | Mar 05 | Ada   | Apollo/Build     | March batch    | 0:30   |
/// | 4  | Mar 05 | Bob   | Apollo/Build     | February (inv) | 2:00   |
/// | 5  | Mar 06 | Ada   | Apollo/Design    | March batch    | 0:15   |
/// | 6  | Mar 06 | Bob   | Borealis/Survey  | April batch    | 0:45   |
///
/// Entry 4 belongs to an invoiced group and is never eligible.
fn data() -> String {
    let d = |n: i64| MAR_04 + n * DAY;
    format!(
        "
INSERT INTO staff VALUES (1, 'Ada Lovelace'), (2, 'Bob Smith');
INSERT INTO projects VALUES (1, 'Apollo'), (2, 'Borealis');
INSERT INTO project_phases VALUES (1, 1, 'Design'), (2, 1, 'Build'), (3, 2, 'Survey');
INSERT INTO time_groups VALUES
    (1, 1, 'March batch', 0),
    (2, 1, 'February batch', 9),
    (3, 2, 'April batch', 0);
INSERT INTO timereg VALUES
    (1, {d0}, 1, 1, 0, 'Wireframes', 3600),
    (2, {d0}, 2, 3, 0, 'Site visit', 5400),
    (3, {d1}, 1, 2, 1, 'Prototype build', 1800),
    (4, {d1}, 2, 2, 2, 'Invoiced work', 7200),
    (5, {d2}, 1, 1, 1, 'Review', 900),
    (6, {d2}, 2, 3, 3, 'Report draft', 2700);
INSERT INTO services VALUES (1, 'Hosting', '25.00'), (2, 'Backups', '10.50'), (3, 'Support', '95.00');
INSERT INTO services_customers VALUES
    (1, 12, 1, 'Main site', 1704067200, 1711929600, 1),
    (2, 12, 2, 'Nightly', 1706745600, 1711929600, 0),
    (3, 12, 3, 'Premium', 1704067200, 1709251200, 1),
    (4, 13, 1, 'Other customer', 1704067200, 1711929600, 1);
",
        d0 = d(0),
        d1 = d(1),
        d2 = d(2),
    )
}

pub fn fixture() -> SqliteDataSource {
    let source = SqliteDataSource::open_in_memory().expect("in-memory database");
    source.execute_batch(SCHEMA).expect("fixture schema");
    source.execute_batch(&data()).expect("fixture data");
    source
}
