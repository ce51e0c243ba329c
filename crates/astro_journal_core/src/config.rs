//! Runtime configuration resolved from the environment.

use crate::editor::AUTOSAVE_DEBOUNCE;
use crate::service::horoscope_client::AZTRO_API_URL;
use crate::store::horoscope::FRESHNESS_WINDOW_MS;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "ASTRO_JOURNAL_DB_PATH";
pub const HOROSCOPE_URL_ENV: &str = "ASTRO_JOURNAL_HOROSCOPE_URL";
pub const STRICT_FETCH_ENV: &str = "ASTRO_JOURNAL_STRICT_FETCH";

const DEFAULT_DB_FILE: &str = "astro_journal.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidFlag { name: &'static str, value: String },
    EmptyValue(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFlag { name, value } => write!(
                f,
                "{name} must be one of 1|0|true|false|yes|no|on|off, got `{value}`"
            ),
            Self::EmptyValue(name) => write!(f, "{name} cannot be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub horoscope_endpoint: String,
    /// `false` in strict mode: remote failures surface as `failed`.
    pub fallback_enabled: bool,
    pub autosave_debounce: Duration,
    pub freshness_window: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            horoscope_endpoint: AZTRO_API_URL.to_string(),
            fallback_enabled: true,
            autosave_debounce: AUTOSAVE_DEBOUNCE,
            freshness_window: Duration::from_millis(FRESHNESS_WINDOW_MS.unsigned_abs()),
        }
    }
}

impl CoreConfig {
    /// Reads overrides from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(DB_PATH_ENV) {
            config.db_path = PathBuf::from(non_empty(DB_PATH_ENV, &value)?);
        }
        if let Some(value) = lookup(HOROSCOPE_URL_ENV) {
            config.horoscope_endpoint = non_empty(HOROSCOPE_URL_ENV, &value)?.to_string();
        }
        if let Some(value) = lookup(STRICT_FETCH_ENV) {
            config.fallback_enabled = !parse_flag(STRICT_FETCH_ENV, &value)?;
        }
        Ok(config)
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

fn non_empty<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue(name));
    }
    Ok(trimmed)
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
