//! Delimited text export.
//!
//! One header row of selected-column labels in preference order, then one
//! row per surviving result row with the rendered values in the same order.
//! No links, controls or totals.

use std::io::Write;

use super::{RenderContext, EMPTY_MESSAGE};
use crate::error::RenderError;
use crate::transform::ResultSet;

pub fn render_export<W: Write>(
    ctx: &RenderContext<'_>,
    result: &ResultSet,
    delimiter: u8,
    mut out: W,
) -> Result<(), RenderError> {
    if result.is_empty() {
        writeln!(out, "{}", EMPTY_MESSAGE)?;
        return Ok(());
    }

    let columns = &ctx.options.selected_columns;
    let labels = ctx.translator.translate(ctx.language, columns);

    let mut writer = ::csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);

    writer.write_record(
        columns
            .iter()
            .map(|c| labels.get(c).map(String::as_str).unwrap_or(c.as_str())),
    )?;
    for row in result.iter() {
        writer.write_record(columns.iter().map(|c| row.display(c)))?;
    }
    writer.flush()?;

    tracing::info!(report = ctx.report, rows = result.len(), "exported report");
    Ok(())
}
