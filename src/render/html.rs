//! Interactive HTML rendering: options form, diagnostics, data table.

use std::collections::HashMap;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use super::{Link, RenderContext, EMPTY_MESSAGE};
use crate::options::{MAX_ORDER_COLUMNS, SUBMITTED_FLAG};
use crate::schema::{Filter, FilterKind};
use crate::transform::{ResultRow, ResultSet};

pub fn render_interactive(ctx: &RenderContext<'_>, result: &ResultSet) -> String {
    let labels = ctx.labels();
    let mut html = String::new();

    render_options_form(ctx, &labels, &mut html);

    for message in ctx.diagnostics {
        html.push_str(&format!(
            "<div class=\"msgbox error\"><p>{}</p></div>\n",
            text(message)
        ));
    }

    if result.is_empty() {
        html.push_str(&format!(
            "<div class=\"msgbox info\"><p>{}</p></div>\n",
            EMPTY_MESSAGE
        ));
    } else {
        render_table(ctx, &labels, result, &mut html);
    }

    html
}

fn label<'a>(labels: &'a HashMap<String, String>, key: &'a str) -> &'a str {
    labels.get(key).map(String::as_str).unwrap_or(key)
}

// =============================================================================
// Options form
// =============================================================================

fn render_options_form(ctx: &RenderContext<'_>, labels: &HashMap<String, String>, html: &mut String) {
    let options = ctx.options;

    html.push_str("<form method=\"get\" class=\"form_standard\">\n");
    html.push_str(&hidden("page", ctx.page));
    html.push_str(&hidden(SUBMITTED_FLAG, ctx.report));

    html.push_str("<table class=\"table_options\"><tr>\n");

    // column checkboxes, split across two groups
    let columns: Vec<&str> = ctx.schema.iter().map(|c| c.key.as_str()).collect();
    let half = columns.len() / 2;
    for (i, group) in [&columns[..half], &columns[half..]].iter().enumerate() {
        html.push_str("<td valign=\"top\">");
        if i == 0 {
            html.push_str("<b>Fields to display:</b><br>");
        }
        html.push('\n');
        for key in group.iter() {
            let checked = if options.selected_columns.iter().any(|c| c == key) {
                " checked"
            } else {
                ""
            };
            html.push_str(&format!(
                "<label><input type=\"checkbox\" name=\"{}\"{}> {}</label><br>\n",
                attr(key),
                checked,
                text(label(labels, key))
            ));
        }
        html.push_str("</td>\n");
    }

    // order selectors
    html.push_str("<td valign=\"top\"><b>Order By (in the following order):</b><br>\n");
    let selectors = options.orderable.len().min(MAX_ORDER_COLUMNS);
    for i in 0..selectors {
        let current = options.order_columns.get(i).map(String::as_str);
        html.push_str(&format!("<select name=\"order_{}\">", i));
        html.push_str("<option value=\"\"></option>");
        for key in &options.orderable {
            html.push_str(&option(key, label(labels, key), current == Some(key.as_str())));
        }
        html.push_str("</select><br>\n");
    }
    html.push_str("</td>\n");

    // filters
    if !ctx.filters.is_empty() {
        html.push_str("<td valign=\"top\"><b>Filter Options:</b><br>\n");
        for filter in ctx.filters.iter() {
            render_filter(filter, options.raw_filter_value(&filter.field), labels, html);
        }
        html.push_str("</td>\n");
    }

    html.push_str("</tr></table>\n");
    html.push_str("<input type=\"submit\" value=\"Apply Options\">\n");
    html.push_str("</form>\n");
}

fn hidden(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
        attr(name),
        attr(value)
    )
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        "<option value=\"{}\"{}>{}</option>",
        attr(value),
        if selected { " selected" } else { "" },
        text(label)
    )
}

fn render_filter(filter: &Filter, value: &str, labels: &HashMap<String, String>, html: &mut String) {
    let name = format!("filter_{}", filter.field);
    let caption = text(label(labels, &filter.field)).into_owned();

    match filter.kind {
        FilterKind::Date | FilterKind::Text => {
            let input_type = if filter.kind == FilterKind::Date { "date" } else { "text" };
            html.push_str(&format!(
                "<label>{} <input type=\"{}\" name=\"{}\" value=\"{}\"></label><br>\n",
                caption,
                input_type,
                attr(&name),
                attr(value)
            ));
        }
        FilterKind::Dropdown => {
            html.push_str(&format!("<label>{} <select name=\"{}\">", caption, attr(&name)));
            html.push_str("<option value=\"\"></option>");
            for choice in filter.options() {
                html.push_str(&option(&choice.id, &choice.label, choice.id == value));
            }
            html.push_str("</select></label><br>\n");
        }
        FilterKind::Radio => {
            html.push_str(&format!("{}: ", caption));
            for choice in filter.options() {
                html.push_str(&format!(
                    "<label><input type=\"radio\" name=\"{}\" value=\"{}\"{}> {}</label> ",
                    attr(&name),
                    attr(&choice.id),
                    if choice.id == value { " checked" } else { "" },
                    text(label(labels, &choice.label))
                ));
            }
            html.push_str("<br>\n");
        }
    }
}

// =============================================================================
// Data table
// =============================================================================

fn render_table(
    ctx: &RenderContext<'_>,
    labels: &HashMap<String, String>,
    result: &ResultSet,
    html: &mut String,
) {
    let columns = &ctx.options.selected_columns;
    let actions: Vec<&Link> = ctx.links.iter().filter(|l| l.column.is_none()).collect();

    html.push_str("<table class=\"table_content\">\n<tr>");
    for key in columns {
        html.push_str(&format!("<th>{}</th>", text(label(labels, key))));
    }
    if !actions.is_empty() {
        html.push_str("<th></th>");
    }
    html.push_str("</tr>\n");

    for row in result.iter() {
        html.push_str("<tr>");
        for key in columns {
            html.push_str("<td>");
            html.push_str(&cell(ctx, row, key));
            html.push_str("</td>");
        }
        if !actions.is_empty() {
            let rendered: Vec<String> = actions
                .iter()
                .map(|link| anchor(ctx, link, row, label(labels, &link.name)))
                .collect();
            html.push_str(&format!("<td align=\"right\">{}</td>", rendered.join(" ")));
        }
        html.push_str("</tr>\n");
    }

    if result.totals().is_some() {
        html.push_str("<tr class=\"totals\">");
        for (i, key) in columns.iter().enumerate() {
            match result.total(key) {
                Some(total) => html.push_str(&format!("<td><b>{}</b></td>", text(&total.display))),
                None if i == 0 => html.push_str("<td><b>Total:</b></td>"),
                None => html.push_str("<td></td>"),
            }
        }
        if !actions.is_empty() {
            html.push_str("<td></td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n");
}

/// A cell's text, wrapped by the first link attached to its column.
fn cell(ctx: &RenderContext<'_>, row: &ResultRow, key: &str) -> String {
    let display = row.display(key);
    let link = ctx
        .links
        .iter()
        .find(|l| l.column.as_deref() == Some(key));

    match link {
        Some(link) if !display.is_empty() => anchor(ctx, link, row, display),
        _ => text(display).into_owned(),
    }
}

fn anchor(ctx: &RenderContext<'_>, link: &Link, row: &ResultRow, caption: &str) -> String {
    let url = ctx.link_renderer.url(&link.target, &link.resolve(row));
    format!("<a href=\"{}\">{}</a>", attr(&url), text(caption))
}
