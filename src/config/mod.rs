//! Configuration module for reportgrid.
//!
//! Handles the config file, environment variable expansion and settings.

mod settings;

pub use settings::{
    expand_env_vars, DatabaseSettings, LoggingSettings, PreferenceBackend, PreferenceSettings,
    RenderSettings, Settings, SettingsError,
};
