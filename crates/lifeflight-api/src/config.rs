//! # API Configuration
//!
//! Environment-based configuration for the REST API service.

use chrono::NaiveDate;
use lifeflight_data::{LoadStrategy, DEFAULT_ENCODING};
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Logging level
    pub log_level: String,

    /// Dataset, population and model locations
    pub data: DataConfig,

    /// Defaults applied to analytics requests
    pub analytics: AnalyticsSettings,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

/// Where the service reads its inputs from
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_path: PathBuf,
    pub encoding: String,
    pub load_strategy: LoadStrategy,
    pub state_population_path: PathBuf,
    pub county_population_path: PathBuf,
    pub model_dir: PathBuf,
}

/// Fixed parameters of the analytics endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsSettings {
    /// Last month of history; forecasts start the month after
    pub forecast_cutoff: NaiveDate,
    pub indicator_year: i32,
    pub indicator_month: u32,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            forecast_cutoff: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap_or_default(),
            indicator_year: 2023,
            indicator_month: 12,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

        let load_strategy = parse_var::<LoadStrategy>(&lookup, "DATASET_CACHE", "false")?;

        let cutoff_raw = get("FORECAST_CUTOFF", "2023-12");
        let forecast_cutoff = NaiveDate::parse_from_str(&format!("{}-01", cutoff_raw.trim()), "%Y-%m-%d")
            .map_err(|e| ConfigError::Invalid {
                var: "FORECAST_CUTOFF",
                value: cutoff_raw.clone(),
                reason: format!("expected YYYY-MM: {e}"),
            })?;

        let indicator_month = parse_var::<u32>(&lookup, "INDICATOR_MONTH", "12")?;
        if !(1..=12).contains(&indicator_month) {
            return Err(ConfigError::Invalid {
                var: "INDICATOR_MONTH",
                value: indicator_month.to_string(),
                reason: "month must be between 1 and 12".into(),
            });
        }

        Ok(Self {
            server_addr: parse_var(&lookup, "SERVER_ADDR", "0.0.0.0:5000")?,

            log_level: get("LOG_LEVEL", "info"),

            data: DataConfig {
                data_path: get("DATA_PATH", "data/1_demand_forecasting/data.csv").into(),
                encoding: get("DATA_ENCODING", DEFAULT_ENCODING),
                load_strategy,
                state_population_path: get(
                    "STATE_POPULATION_PATH",
                    "data/processed/population_parsed.csv",
                )
                .into(),
                county_population_path: get(
                    "COUNTY_POPULATION_PATH",
                    "data/processed/county_population_2020_2024.csv",
                )
                .into(),
                model_dir: get("MODEL_DIR", "model").into(),
            },

            analytics: AnalyticsSettings {
                forecast_cutoff,
                indicator_year: parse_var(&lookup, "INDICATOR_YEAR", "2023")?,
                indicator_month,
            },

            cors_origins: get("CORS_ORIGINS", "*")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(var).unwrap_or_else(|| default.to_string());
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}
