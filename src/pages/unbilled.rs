//! Unbilled time: every time entry not yet added to an invoice.
//!
//! Eligible entries are either outside any time group, or in a group that
//! has no invoice yet. The eligible ids are collected up front and become an
//! allow-list on `timereg.id`. Entries whose group gets invoiced between that
//! pre-query and the main query are dropped after the fetch, or excluded in
//! the query itself when rows are aggregated.

use std::collections::BTreeSet;

use super::ReportPage;
use crate::builder::{FixedPredicate, QuerySource};
use crate::datasource::DataSource;
use crate::error::{QueryError, ReportResult};
use crate::options::RequestParams;
use crate::render::Link;
use crate::report::Report;
use crate::schema::{ColumnKind, Filter, ValueSource};
use crate::sql::{SqlValue, Statement};
use crate::transform::DropRule;

pub const REPORT_KEY: &str = "timereg_unbilled";

const UNGROUPED_SQL: &str = "SELECT id FROM timereg WHERE groupid = 0";
const OPEN_GROUPS_SQL: &str = "SELECT timereg.id AS id FROM timereg \
     JOIN time_groups ON timereg.groupid = time_groups.id \
     WHERE time_groups.invoiceid = 0";
const OPEN_GROUP_PREDICATE: &str = "time_groups.invoiceid IS NULL OR time_groups.invoiceid = 0";

const PHASE_LOOKUP_SQL: &str = "SELECT projects.name_project AS label, \
     project_phases.id AS id, project_phases.name_phase AS label1 \
     FROM projects \
     LEFT JOIN project_phases ON project_phases.projectid = projects.id \
     ORDER BY projects.name_project, project_phases.name_phase";
const STAFF_LOOKUP_SQL: &str = "SELECT id, name_staff AS label FROM staff ORDER BY name_staff ASC";

#[derive(Debug, Clone, Copy, Default)]
pub struct UnbilledTime;

impl UnbilledTime {
    /// Ids of time entries that have not been invoiced.
    pub fn eligible_ids(source: &dyn DataSource) -> Result<Vec<SqlValue>, QueryError> {
        let mut ids = BTreeSet::new();
        for sql in [UNGROUPED_SQL, OPEN_GROUPS_SQL] {
            let rows = source.query(&Statement::raw(sql))?;
            ids.extend(rows.values("id").iter().filter_map(SqlValue::as_i64));
        }
        Ok(ids.into_iter().map(SqlValue::Int).collect())
    }
}

impl ReportPage for UnbilledTime {
    fn name(&self) -> &'static str {
        "unbilled"
    }

    fn path(&self) -> &'static str {
        "timekeeping/unbilled.php"
    }

    fn title(&self) -> &'static str {
        "Unbilled Time"
    }

    fn build(&self, source: &dyn DataSource, _request: &RequestParams) -> ReportResult<Report> {
        let (ids, failure) = match Self::eligible_ids(source) {
            Ok(ids) => (ids, None),
            Err(err) => {
                tracing::warn!(error = %err, "unbilled pre-query failed");
                (Vec::new(), Some(err))
            }
        };
        tracing::debug!(eligible = ids.len(), "collected unbilled time entries");

        let query_source = QuerySource::new("timereg")
            .field("projectid", "projects.id")
            .field("employeeid", "timereg.employeeid")
            .field("timegroupid", "time_groups.id")
            .field("timegroupinvoiceid", "time_groups.invoiceid")
            .join("LEFT JOIN staff ON timereg.employeeid = staff.id")
            .join("LEFT JOIN time_groups ON timereg.groupid = time_groups.id")
            .join("LEFT JOIN project_phases ON timereg.phaseid = project_phases.id")
            .join("LEFT JOIN projects ON project_phases.projectid = projects.id");

        let mut builder = Report::builder(REPORT_KEY, query_source);
        builder
            .add_column(ColumnKind::Date, "date", "timereg.date")?
            .add_column(
                ColumnKind::Standard,
                "name_phase",
                "projects.name_project || ' -- ' || project_phases.name_phase",
            )?
            .add_column(ColumnKind::Standard, "name_staff", "staff.name_staff")?
            .add_column(ColumnKind::Standard, "time_group", "time_groups.name_group")?
            .add_column(ColumnKind::Standard, "description", "timereg.description")?
            .add_column(ColumnKind::Hourmins, "time_booked", "timereg.time_booked")?;

        builder
            .add_filter(Filter::date("date_start", "timereg.date >= {value}")?)?
            .add_filter(Filter::date("date_end", "timereg.date < {value} + 86400")?)?
            .add_filter(Filter::dropdown(
                "phaseid",
                "project_phases.id = {value}",
                ValueSource::Lookup(PHASE_LOOKUP_SQL.to_string()),
            )?)?
            .add_filter(Filter::dropdown(
                "employeeid",
                "timereg.employeeid = {value}",
                ValueSource::Lookup(STAFF_LOOKUP_SQL.to_string()),
            )?)?
            .add_filter(Filter::text(
                "searchbox",
                "timereg.description LIKE {%value%} \
                 OR project_phases.name_phase LIKE {%value%} \
                 OR staff.name_staff LIKE {%value%}",
            )?)?
            .add_group_by(&["name_phase", "name_staff"])?;

        builder
            .add_fixed_predicate(FixedPredicate::allow_list("timereg.id", ids))
            .set_totals(&["time_booked"])
            .set_defaults(
                &[
                    "date",
                    "name_phase",
                    "name_staff",
                    "time_group",
                    "description",
                    "time_booked",
                ],
                &["date", "name_phase"],
            )
            .set_orderable(&["date", "name_phase", "name_staff", "time_group", "description"]);

        let mut report = builder.build()?;

        if let Some(err) = failure {
            report.add_diagnostic(err.to_string());
        }

        report.add_drop_rule(DropRule::new("invoiced time group", |row| {
            row.raw("timegroupinvoiceid").is_some_and(|v| v.is_truthy())
        }));

        report
            .add_link(
                Link::new("tbl_lnk_project", "projects/timebooked.php")
                    .param("id", "projectid")
                    .on_column("name_phase"),
            )?
            .add_link(
                Link::new("tbl_lnk_groupid", "projects/timebooked.php")
                    .param("id", "projectid")
                    .param("groupid", "timegroupid")
                    .on_column("time_group"),
            )?;

        Ok(report)
    }

    fn after_options(&self, report: &mut Report) -> ReportResult<()> {
        if report.options().is_aggregated() {
            // a grouped row mixes entries, so invoiced ones must not reach the sums
            report.add_fixed_predicate(FixedPredicate::Raw(OPEN_GROUP_PREDICATE.to_string()));
        } else {
            report.add_link(
                Link::new("tbl_lnk_view_timeentry", "timekeeping/timereg-day-edit.php")
                    .param("id", "id")
                    .param("date", "date")
                    .param("employeeid", "employeeid"),
            )?;
        }
        Ok(())
    }
}
