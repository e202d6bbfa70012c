//! TOML-based configuration for reportgrid.
//!
//! Supports a config file (reportgrid.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [database]
//! path = "${REPORTGRID_DB}"
//! dialect = "sqlite"
//!
//! [preferences]
//! backend = "sqlite"
//! path = "./prefs.db"
//!
//! [render]
//! language = "en_us"
//! page_base = "index.php"
//! csv_delimiter = ","
//!
//! [labels.en_us]
//! name_staff = "Employee"
//! time_booked = "Time Booked"
//!
//! [logging]
//! filter = "reportgrid=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,

    pub preferences: PreferenceSettings,

    pub render: RenderSettings,

    /// Column and filter labels, keyed by language then by key.
    pub labels: BTreeMap<String, BTreeMap<String, String>>,

    pub logging: LoggingSettings,
}

/// Report data source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database (supports ${ENV_VAR} expansion).
    pub path: String,

    /// SQL dialect used when printing generated queries.
    pub dialect: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "reportgrid.db".to_string(),
            dialect: "sqlite".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.path).map(PathBuf::from)
    }

    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        self.dialect
            .parse()
            .map_err(|_| SettingsError::UnsupportedDialect(self.dialect.clone()))
    }
}

/// Where display preferences are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceBackend {
    /// Lives for the process only.
    Memory,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PreferenceSettings {
    pub backend: PreferenceBackend,

    /// Store location; defaults to the user data directory.
    pub path: Option<String>,
}

impl PreferenceSettings {
    /// Store path with environment variables expanded, if configured.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Language used for label lookup.
    pub language: String,

    /// Base path of generated links and of the options form action.
    pub page_base: String,

    /// Field delimiter for exports.
    pub csv_delimiter: char,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            language: "en_us".to_string(),
            page_base: "index.php".to_string(),
            csv_delimiter: ',',
        }
    }
}

impl RenderSettings {
    /// The delimiter as a single byte, as the CSV writer wants it.
    pub fn delimiter_byte(&self) -> Result<u8, SettingsError> {
        u8::try_from(self.csv_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                SettingsError::InvalidConfig(format!(
                    "csv_delimiter must be an ASCII character, got '{}'",
                    self.csv_delimiter
                ))
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, used when RUST_LOG is unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "reportgrid=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.render.delimiter_byte()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `REPORTGRID_CONFIG`
    /// 2. `./reportgrid.toml`
    /// 3. `~/.config/reportgrid/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("REPORTGRID_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("reportgrid.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("reportgrid").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Labels configured for a language; empty if none.
    pub fn labels_for(&self, language: &str) -> BTreeMap<String, String> {
        self.labels.get(language).cloned().unwrap_or_default()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                name.push(ch);
            }
            name
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                name.push(ch);
                chars.next();
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
