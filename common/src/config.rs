//! Collector configuration.
//!
//! Everything is read from the process environment once at start-up.
//! [`AppConfig::from_lookup`] takes the lookup as a closure so tests can feed a map.

use std::collections::BTreeSet;
use std::fmt;

use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Default provider API base URL.
pub const DEFAULT_API_URL: &str = "https://api.equinix.com";

/// Default InfluxDB port.
pub const DEFAULT_DB_PORT: u16 = 8086;

/// Default stats window, in minutes (24 hours).
pub const DEFAULT_WINDOW_MINUTES: i64 = 1440;

/// Longest accepted stats window, in minutes (366 days).
pub const MAX_WINDOW_MINUTES: i64 = 527_040;

/// Default HTTP client timeout, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Sinks written when `SINKS` is not set.
pub const DEFAULT_SINKS: [&str; 2] = ["campus", "network"];

/// Connections skipped when `EXCLUDED_CONNECTION_IDS` is not set.
pub const DEFAULT_EXCLUDED_IDS: [&str; 4] = [
    "8d35a896-f363-4ff6-8d07-470d398cbdf5",
    "e6fc49c5-c5b2-4ed0-acb6-7ac915b175b0",
    "33149ec5-943d-418a-9a22-b99bad5d1e11",
    "9f917a9e-24e3-4353-8db4-55c708d15243",
];

/// Provider API client credentials.
#[derive(Clone, Validate)]
pub struct ApiCredentials {
    #[validate(length(min = 1, message = "client_id is not set"))]
    pub client_id: String,
    #[validate(length(min = 1, message = "client_secret is not set"))]
    pub client_secret: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Connection parameters for one InfluxDB sink.
#[derive(Clone, Validate)]
pub struct SinkConfig {
    /// Sink name, used in logs and as the env var prefix.
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1, message = "database host is not set"))]
    pub host: String,
    #[validate(range(min = 1, message = "database port must be non-zero"))]
    pub port: u16,
    #[validate(length(min = 1, message = "database user is not set"))]
    pub username: String,
    #[validate(length(min = 1, message = "database password is not set"))]
    pub password: String,
    #[validate(length(min = 1, message = "database name is not set"))]
    pub database: String,
}

impl SinkConfig {
    /// Base URL of the sink. Sinks built from configuration always use TLS.
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Full collector configuration.
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub api: ApiCredentials,
    /// Provider API base URL, without trailing slash.
    #[validate(url(message = "FABRIC_API_URL is not a valid URL"))]
    pub api_url: String,
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
    /// Connection ids never collected.
    pub excluded_ids: BTreeSet<String>,
    #[validate(range(
        min = 1,
        max = 527040,
        message = "STATS_WINDOW_MINUTES must be between 1 and 527040"
    ))]
    pub window_minutes: i64,
    #[validate(range(min = 1, message = "HTTP_TIMEOUT_SECS must be positive"))]
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, then validates it.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api = ApiCredentials {
            client_id: var("client_id").or_else(|| var("CLIENT_ID")).unwrap_or_default(),
            client_secret: var("client_secret")
                .or_else(|| var("CLIENT_SECRET"))
                .unwrap_or_default(),
        };

        let sink_names: Vec<String> = match var("SINKS") {
            Some(list) => split_list(&list),
            None => DEFAULT_SINKS.iter().map(|s| s.to_string()).collect(),
        };
        if sink_names.is_empty() {
            return Err(AppError::Config("SINKS lists no sinks".into()));
        }

        let mut sinks = Vec::with_capacity(sink_names.len());
        for name in sink_names {
            let prefix = name.to_uppercase();
            let scoped = |suffix: &str| var(&format!("{}_{}", prefix, suffix));
            let port = match scoped("DB_PORT").or_else(|| var("INFLUXDB_PORT")) {
                Some(raw) => parse_number::<u16>(&format!("{}_DB_PORT", prefix), &raw)?,
                None => DEFAULT_DB_PORT,
            };
            sinks.push(SinkConfig {
                host: scoped("DB_HOST").or_else(|| var("INFLUXDB_HOST")).unwrap_or_default(),
                port,
                username: scoped("DB_USER").unwrap_or_default(),
                password: scoped("DB_PASS").unwrap_or_default(),
                database: scoped("DB").or_else(|| var("INFLUXDB_DB")).unwrap_or_default(),
                name,
            });
        }

        let excluded_ids = match var("EXCLUDED_CONNECTION_IDS") {
            Some(list) => split_list(&list).into_iter().collect(),
            None => DEFAULT_EXCLUDED_IDS.iter().map(|s| s.to_string()).collect(),
        };

        let window_minutes = match var("STATS_WINDOW_MINUTES") {
            Some(raw) => parse_number("STATS_WINDOW_MINUTES", &raw)?,
            None => DEFAULT_WINDOW_MINUTES,
        };
        let http_timeout_secs = match var("HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_number("HTTP_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let config = Self {
            api,
            api_url: var("FABRIC_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            sinks,
            excluded_ids,
            window_minutes,
            http_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.parse()
        .map_err(|_| AppError::Config(format!("{} is not a valid number: {}", key, raw)))
}
