//! Services subscribed by one customer.

use super::ReportPage;
use crate::builder::{FixedPredicate, QuerySource};
use crate::datasource::DataSource;
use crate::error::{ReportError, ReportResult};
use crate::options::RequestParams;
use crate::render::Link;
use crate::report::Report;
use crate::schema::{ColumnKind, Filter};
use crate::transform::DropRule;

pub const REPORT_KEY: &str = "services_customers";

/// Radio filter revealing disabled services.
pub const SHOW_DISABLED_FIELD: &str = "show_disabled";

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerServices;

impl ReportPage for CustomerServices {
    fn name(&self) -> &'static str {
        "services"
    }

    fn path(&self) -> &'static str {
        "customers/services.php"
    }

    fn title(&self) -> &'static str {
        "Customer Services"
    }

    fn build(&self, _source: &dyn DataSource, request: &RequestParams) -> ReportResult<Report> {
        let customer_id = request
            .value("customerid")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| ReportError::InvalidParam {
                name: "customerid".to_string(),
            })?;

        let query_source = QuerySource::new("services_customers")
            .field("customerid", "services_customers.customerid")
            .field("enabled", "services_customers.active")
            .join("LEFT JOIN services ON services_customers.serviceid = services.id");

        let mut builder = Report::builder(REPORT_KEY, query_source);
        builder
            .add_column(ColumnKind::Standard, "name_service", "services.name_service")?
            .add_column(ColumnKind::Standard, "description", "services_customers.description")?
            .add_column(ColumnKind::Price, "price", "services.price")?
            .add_column(ColumnKind::Date, "date_period_first", "services_customers.date_period_first")?
            .add_column(ColumnKind::Date, "date_period_next", "services_customers.date_period_next")?
            .add_column(ColumnKind::Standard, "active", "services_customers.active")?;

        builder
            .add_filter(Filter::text(
                "searchbox",
                "services.name_service LIKE {%value%} OR services_customers.description LIKE {%value%}",
            )?)?
            .add_filter(Filter::radio(SHOW_DISABLED_FIELD, &["no", "yes"])?.with_default("no"))?;

        builder
            .add_fixed_predicate(FixedPredicate::equals("services_customers.customerid", customer_id))
            .set_totals(&["price"])
            .set_defaults(
                &["name_service", "description", "price", "date_period_next", "active"],
                &["name_service"],
            );

        let mut report = builder.build()?;
        report.add_link(
            Link::new("tbl_lnk_details", "customers/service-edit.php")
                .param("customerid", "customerid")
                .param("serviceid", "id"),
        )?;
        Ok(report)
    }

    fn after_options(&self, report: &mut Report) -> ReportResult<()> {
        let show_disabled = report
            .options()
            .filter_value(SHOW_DISABLED_FIELD)
            .is_some_and(|v| v.to_string() == "yes");

        if !show_disabled {
            report.add_drop_rule(DropRule::new("disabled service", |row| {
                !row.raw("enabled").is_some_and(|v| v.is_truthy())
            }));
        }
        Ok(())
    }
}
