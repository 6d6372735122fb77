use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use skillhub_api::state::ApiSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub api: ApiSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or blank variables take their defaults; anything unparsable
    /// fails startup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = ApiSettings::default();

        let config = Self {
            host: get("SKILLHUB_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(get("SKILLHUB_PORT"), "SKILLHUB_PORT", 8080)?,
            db_path: get("SKILLHUB_DB_PATH")
                .unwrap_or_else(|| "skillhub.db".into())
                .into(),
            api: ApiSettings {
                reset_units_on_fork: parse_or(
                    get("SKILLHUB_RESET_UNITS_ON_FORK"),
                    "SKILLHUB_RESET_UNITS_ON_FORK",
                    defaults.reset_units_on_fork,
                )?,
                default_page_size: parse_or(
                    get("SKILLHUB_DEFAULT_PAGE_SIZE"),
                    "SKILLHUB_DEFAULT_PAGE_SIZE",
                    defaults.default_page_size,
                )?,
                max_page_size: parse_or(
                    get("SKILLHUB_MAX_PAGE_SIZE"),
                    "SKILLHUB_MAX_PAGE_SIZE",
                    defaults.max_page_size,
                )?,
            },
        };

        if config.api.max_page_size == 0 {
            anyhow::bail!("SKILLHUB_MAX_PAGE_SIZE must be at least 1");
        }
        Ok(config)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, v)),
        None => Ok(default),
    }
}
