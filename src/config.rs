//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `WEATHER_*` environment variables. Two variables are read directly:
//! `WEATHER_LOCATIONS` (a JSON list of `{"name","lat","lon"}`) and
//! `BACKFILL_DATE` (`YYYY-MM-DD`). The result is built once at start-up and
//! passed into the run; nothing reads the environment after that.

use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{EtlError, Result};
use crate::models::{LocationConfig, LocationSet};
use crate::utils::constants::{
    BACKFILL_DATE_ENV, COMPRESSION_SNAPPY, DEFAULT_API_URL, DEFAULT_BUCKET,
    DEFAULT_REQUEST_TIMEOUT_SECS, LOCATIONS_ENV,
};

#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    /// Root of the partitioned output (a directory or mounted bucket).
    pub bucket: String,

    pub api_url: String,

    pub request_timeout_secs: u64,

    pub compression: String,

    /// Explicit date for a backfill run; `None` means today (UTC).
    #[serde(default)]
    pub run_date: Option<NaiveDate>,

    #[serde(default = "default_locations")]
    pub locations: Vec<LocationConfig>,
}

fn default_locations() -> Vec<LocationConfig> {
    vec![
        LocationConfig::new("seattle", 47.6062, -122.3321),
        LocationConfig::new("newyork", 40.7128, -74.0060),
    ]
}

impl EtlConfig {
    /// Load from `path` (required when given) or the default file if present,
    /// overlaid with the process environment.
    pub fn load(path: Option<&Path>, default_path: &Path) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p, true),
            None => (default_path, false),
        };
        let env: config::Map<String, String> = std::env::vars().collect();
        Self::load_from(Some(file), required, env)
    }

    pub fn load_from(
        file: Option<&Path>,
        required: bool,
        env: config::Map<String, String>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("bucket", DEFAULT_BUCKET)?
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default("compression", COMPRESSION_SNAPPY)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(required));
        }

        // JSON locations are parsed separately below
        let prefixed: config::Map<String, String> = env
            .iter()
            .filter(|(k, _)| k.as_str() != LOCATIONS_ENV)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        builder = builder.add_source(
            Environment::with_prefix("WEATHER")
                .try_parsing(true)
                .source(Some(prefixed)),
        );

        let mut config: EtlConfig = builder.build()?.try_deserialize()?;

        if let Some(raw) = env.get(LOCATIONS_ENV).filter(|v| !v.trim().is_empty()) {
            config.locations = serde_json::from_str(raw)?;
        }

        if let Some(raw) = env.get(BACKFILL_DATE_ENV).filter(|v| !v.trim().is_empty()) {
            config.run_date = Some(raw.trim().parse::<NaiveDate>()?);
        }

        if config.request_timeout_secs == 0 {
            return Err(EtlError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn location_set(&self) -> Result<LocationSet> {
        LocationSet::from_configs(&self.locations)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  bucket          : {}", self.bucket);
        info!("  api_url         : {}", self.api_url);
        info!("  request_timeout : {}s", self.request_timeout_secs);
        info!("  compression     : {}", self.compression);
        match self.run_date {
            Some(date) => info!("  run_date        : {} (backfill)", date),
            None => info!("  run_date        : today (UTC)"),
        }
        info!("  locations       : {}", self.locations.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = EtlConfig::load_from(None, false, env(&[])).unwrap();

        assert_eq!(config.bucket, DEFAULT_BUCKET);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.run_date, None);
        assert_eq!(config.location_set().unwrap().names(), vec!["seattle", "newyork"]);
    }

    #[test]
    fn test_environment_overrides() {
        let config = EtlConfig::load_from(
            None,
            false,
            env(&[
                ("WEATHER_BUCKET", "/data/lake"),
                ("WEATHER_REQUEST_TIMEOUT_SECS", "5"),
                ("WEATHER_LOCATIONS", r#"[{"name":" Oslo ","lat":59.91,"lon":10.75}]"#),
                ("BACKFILL_DATE", "2024-02-29"),
            ]),
        )
        .unwrap();

        assert_eq!(config.bucket, "/data/lake");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.run_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(config.location_set().unwrap().names(), vec!["oslo"]);
    }

    #[test]
    fn test_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather-etl.toml");
        std::fs::write(
            &path,
            r#"
bucket = "/srv/weather"
compression = "zstd"
run_date = "2023-07-04"

[[locations]]
name = "denver"
lat = 39.7392
lon = -104.9903
"#,
        )
        .unwrap();

        let config = EtlConfig::load_from(Some(&path), true, env(&[])).unwrap();

        assert_eq!(config.bucket, "/srv/weather");
        assert_eq!(config.compression, "zstd");
        assert_eq!(config.run_date, NaiveDate::from_ymd_opt(2023, 7, 4));
        assert_eq!(config.location_set().unwrap().names(), vec!["denver"]);
    }

    #[test]
    fn test_missing_optional_file_is_fine() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(EtlConfig::load_from(Some(&path), false, env(&[])).is_ok());
        assert!(EtlConfig::load_from(Some(&path), true, env(&[])).is_err());
    }

    #[test]
    fn test_invalid_backfill_date() {
        let result = EtlConfig::load_from(None, false, env(&[("BACKFILL_DATE", "yesterday")]));
        assert!(matches!(result, Err(EtlError::DateParse(_))));
    }

    #[test]
    fn test_invalid_locations_json() {
        let result = EtlConfig::load_from(None, false, env(&[("WEATHER_LOCATIONS", "[{")]));
        assert!(matches!(result, Err(EtlError::Json(_))));
    }
}
