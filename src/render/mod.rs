//! Output of a resolved, executed report.
//!
//! Two modes share one [`ResultSet`](crate::transform::ResultSet):
//! - [`html`]: interactive table with the options form
//! - [`csv`]: flat export of the selected columns

pub mod csv;
pub mod html;
pub mod labels;
pub mod links;

pub use labels::{humanize, HumanizeTranslator, MapTranslator, Translator};
pub use links::{Link, LinkRenderer, QueryStringLinks};

use std::collections::HashMap;

use crate::options::ResolvedOptions;
use crate::schema::{ColumnSchema, FilterKind, FilterSet};

/// Shown instead of an empty table.
pub const EMPTY_MESSAGE: &str = "There are no rows matching your search filter options.";

/// Everything a renderer needs besides the rows.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Report key, echoed by the options form.
    pub report: &'a str,
    /// Page path, echoed by the options form.
    pub page: &'a str,
    pub language: &'a str,
    pub schema: &'a ColumnSchema,
    pub filters: &'a FilterSet,
    pub options: &'a ResolvedOptions,
    pub links: &'a [Link],
    /// Recovered failures to show above the table.
    pub diagnostics: &'a [String],
    pub translator: &'a dyn Translator,
    pub link_renderer: &'a dyn LinkRenderer,
}

impl RenderContext<'_> {
    /// Labels for every schema column, link and filter choice.
    pub fn labels(&self) -> HashMap<String, String> {
        let mut keys = self.schema.keys();
        keys.extend(self.links.iter().map(|l| l.name.clone()));
        for filter in self.filters.iter() {
            keys.push(filter.field.clone());
            if filter.kind == FilterKind::Radio {
                keys.extend(filter.options().iter().map(|o| o.label.clone()));
            }
        }
        self.translator.translate(self.language, &keys)
    }
}
