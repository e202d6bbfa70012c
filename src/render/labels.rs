//! Human-readable labels for column and filter keys.

use std::collections::{BTreeMap, HashMap};

use crate::config::Settings;

/// Resolves display labels for keys in a language.
///
/// Every requested key gets an entry; a key with no translation maps to
/// a fallback chosen by the implementation.
pub trait Translator {
    fn translate(&self, language: &str, keys: &[String]) -> HashMap<String, String>;

    fn label(&self, language: &str, key: &str) -> String {
        self.translate(language, &[key.to_string()])
            .remove(key)
            .unwrap_or_else(|| key.to_string())
    }
}

/// Labels from a `language -> key -> label` table; missing keys fall back to
/// the key itself.
#[derive(Debug, Clone, Default)]
pub struct MapTranslator {
    labels: BTreeMap<String, BTreeMap<String, String>>,
}

impl MapTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `[labels.<language>]` tables of the config file.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            labels: settings.labels.clone(),
        }
    }

    pub fn with_label(mut self, language: &str, key: &str, label: &str) -> Self {
        self.labels
            .entry(language.to_string())
            .or_default()
            .insert(key.to_string(), label.to_string());
        self
    }
}

impl Translator for MapTranslator {
    fn translate(&self, language: &str, keys: &[String]) -> HashMap<String, String> {
        let table = self.labels.get(language);
        keys.iter()
            .map(|key| {
                let label = table
                    .and_then(|t| t.get(key))
                    .cloned()
                    .unwrap_or_else(|| key.clone());
                (key.clone(), label)
            })
            .collect()
    }
}

/// Derives a label from the key: `name_staff` becomes `Name Staff`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanizeTranslator;

pub fn humanize(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl Translator for HumanizeTranslator {
    fn translate(&self, _language: &str, keys: &[String]) -> HashMap<String, String> {
        keys.iter().map(|k| (k.clone(), humanize(k))).collect()
    }
}
