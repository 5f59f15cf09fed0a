use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{fs, path::PathBuf};

/// Explicit configuration for a run: endpoints, fallback locations and the
/// retry policy. Constructed once and passed into each component, never held
/// as ambient state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Forecast endpoint; the city identifier is appended verbatim.
    pub forecast_url: String,

    /// Remote XML document mapping city names to forecast identifiers.
    pub city_table_url: String,

    /// Local copy of the city table, used when the remote fetch fails.
    pub city_table_fallback: PathBuf,

    /// Number of retries after the initial attempt.
    pub retry_count: u32,

    /// Fixed wait in seconds before a retry when the server gave no usable
    /// `Retry-After` hint.
    pub seconds_before_retry: u64,

    /// Upper bound for a server-supplied `Retry-After` hint. Hints at or
    /// above this ceiling fall back to `seconds_before_retry`.
    pub max_seconds_before_retry: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forecast_url: "http://weather.livedoor.com/forecast/webservice/json/v1?city="
                .to_string(),
            city_table_url: "http://weather.livedoor.com/forecast/rss/primary_area.xml".to_string(),
            city_table_fallback: PathBuf::from("data/primary_area.xml"),
            retry_count: 3,
            seconds_before_retry: 5,
            max_seconds_before_retry: 10,
        }
    }
}

impl Config {
    /// Load config from disk, or return the defaults if no file exists yet.
    /// The file may override any subset of the fields.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "tenki", "tenki-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_policy() {
        let cfg = Config::default();

        assert_eq!(cfg.retry_count, 3);
        assert_eq!(cfg.seconds_before_retry, 5);
        assert_eq!(cfg.max_seconds_before_retry, 10);
        assert!(cfg.forecast_url.ends_with("?city="));
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: Config = toml::from_str(
            r#"
            retry_count = 1
            seconds_before_retry = 2
            "#,
        )
        .expect("partial config must parse");

        assert_eq!(cfg.retry_count, 1);
        assert_eq!(cfg.seconds_before_retry, 2);
        assert_eq!(cfg.max_seconds_before_retry, 10);
        assert_eq!(cfg.city_table_fallback, PathBuf::from("data/primary_area.xml"));
    }

    #[test]
    fn endpoint_override_parses() {
        let cfg: Config = toml::from_str(
            r#"
            forecast_url = "http://localhost:8080/v1?city="
            "#,
        )
        .expect("endpoint override must parse");

        assert_eq!(cfg.forecast_url, "http://localhost:8080/v1?city=");
    }
}
