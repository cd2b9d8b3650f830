use std::time::Duration;

use chrono_tz::Tz;
use reqwest::Url;

use crate::services::wms::{DEFAULT_RADAR_LAYER, DEFAULT_WMS_URL};

const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 8;
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("RADAR_TIMEZONE '{0}' is not a known IANA timezone")]
    UnknownTimezone(String),

    #[error("RADAR_WMS_URL '{0}' is not a valid URL")]
    InvalidUrl(String),

    #[error("radar HTTP client could not be built: {0}")]
    HttpClient(String),
}

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Radar WMS base endpoint (GetMap parameters are appended).
    pub wms_url: Url,
    pub radar_layer: String,
    pub user_agent: String,
    /// Civil timezone used for step flooring and local timestamps.
    pub timezone: Tz,
    pub request_timeout: Duration,
    pub max_concurrent_fetches: usize,
    /// Reject missing/non-numeric coordinates instead of defaulting to 0.
    pub strict_coordinates: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse("PORT", 8080u16, "a valid port number")?;

        let wms_url_raw = env_string("RADAR_WMS_URL", DEFAULT_WMS_URL);
        let wms_url = Url::parse(&wms_url_raw).map_err(|_| ConfigError::InvalidUrl(wms_url_raw))?;

        let timezone_raw = env_string("RADAR_TIMEZONE", DEFAULT_TIMEZONE);
        let timezone: Tz = timezone_raw
            .parse()
            .map_err(|_| ConfigError::UnknownTimezone(timezone_raw.clone()))?;

        let timeout_secs = env_parse(
            "RADAR_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
            "a whole number of seconds",
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RADAR_REQUEST_TIMEOUT_SECS",
                expected: "at least 1",
                value: "0".to_string(),
            });
        }

        let max_concurrent_fetches = env_parse(
            "RADAR_MAX_CONCURRENT_FETCHES",
            DEFAULT_MAX_CONCURRENT_FETCHES,
            "a positive integer",
        )?;
        if max_concurrent_fetches == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RADAR_MAX_CONCURRENT_FETCHES",
                expected: "at least 1",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port,
            wms_url,
            radar_layer: env_string("RADAR_LAYER", DEFAULT_RADAR_LAYER),
            user_agent: std::env::var("RADAR_USER_AGENT")
                .unwrap_or_else(|_| format!("rain_radar_api/{}", env!("CARGO_PKG_VERSION"))),
            timezone,
            request_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_fetches,
            strict_coordinates: env_parse("RADAR_STRICT_COORDINATES", false, "true or false")?,
        })
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}
