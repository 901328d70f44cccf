use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use snafu::{ensure, ResultExt, Snafu};

use crate::database::DatabaseConfig;
use crate::model::{Catalog, CatalogError, DEFAULT_CONTENT_TYPES};
use crate::service::rate_limiter::{RateLimitConfig, RateLimitConfigError};
use crate::service::recorder::{Simulation, SimulationConfigError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    /// could not parse the configuration from the environment
    #[snafu(display("could not read the configuration from the environment: {source}"))]
    Load { source: envy::Error },

    #[snafu(display("invalid content types: {source}"))]
    ContentTypes { source: CatalogError },

    #[snafu(display("invalid rate limit: {source}"))]
    RateLimit { source: RateLimitConfigError },

    #[snafu(display("invalid processing simulation: {source}"))]
    Processing { source: SimulationConfigError },

    #[snafu(display("flush interval must be longer than zero"))]
    ZeroFlushInterval,
}

/// Process configuration, read once at startup from the environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_content_types")]
    pub content_types: Vec<String>,
    #[serde(
        default = "default_flush_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub flush_interval: Duration,

    #[serde(default = "default_refill")]
    pub rate_limit_per_second: f64,
    #[serde(default = "default_burst")]
    pub rate_limit_burst: u32,

    #[serde(
        default = "default_max_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub processing_max_delay: Duration,
    #[serde(default)]
    pub processing_failure_rate: f64,
    #[serde(default = "default_click_probability")]
    pub click_probability: f64,

    #[serde(flatten)]
    pub database: DatabaseConfig,
}

/// The validated pieces of [Config] the services are built from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: Catalog,
    pub rate_limit: RateLimitConfig,
    pub simulation: Simulation,
    pub flush_interval: Duration,
}

impl Config {
    /// Load the raw configuration. Validation happens in [Config::settings].
    pub fn from_env() -> Result<Config, ConfigError> {
        envy::from_env().context(LoadSnafu)
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let catalog = Catalog::new(&self.content_types).context(ContentTypesSnafu)?;

        let rate_limit = RateLimitConfig {
            refill_per_second: self.rate_limit_per_second,
            burst: self.rate_limit_burst,
        };
        rate_limit.validate().context(RateLimitSnafu)?;

        let simulation = Simulation {
            max_delay: self.processing_max_delay,
            failure_rate: self.processing_failure_rate,
            click_probability: self.click_probability,
        };
        simulation.validate().context(ProcessingSnafu)?;

        ensure!(!self.flush_interval.is_zero(), ZeroFlushIntervalSnafu);

        Ok(Settings {
            catalog,
            rate_limit,
            simulation,
            flush_interval: self.flush_interval,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            log_dir: default_log_dir(),
            content_types: default_content_types(),
            flush_interval: default_flush_interval(),
            rate_limit_per_second: default_refill(),
            rate_limit_burst: default_burst(),
            processing_max_delay: default_max_delay(),
            processing_failure_rate: 0.0,
            click_probability: default_click_probability(),
            database: DatabaseConfig::default(),
        }
    }
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_content_types() -> Vec<String> {
    DEFAULT_CONTENT_TYPES.iter().map(|name| name.to_string()).collect()
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_refill() -> f64 {
    RateLimitConfig::default().refill_per_second
}

fn default_burst() -> u32 {
    RateLimitConfig::default().burst
}

fn default_max_delay() -> Duration {
    Simulation::default().max_delay
}

fn default_click_probability() -> f64 {
    Simulation::default().click_probability
}

/// Parse durations written like `5s` or `250ms`.
fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::from_iter(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        )
    }

    #[test]
    fn defaults_are_valid() {
        let config = from_pairs(&[]).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(config.host, default_host());
        assert_eq!(settings.catalog, Catalog::default());
        assert_eq!(settings.rate_limit, RateLimitConfig::default());
        assert_eq!(settings.flush_interval, Duration::from_secs(5));
        assert_eq!(config.database.url.as_str(), "mem://");
        assert!(config.database.credentials.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = from_pairs(&[
            ("HOST_ADDRESS", "127.0.0.1:3000"),
            ("CONTENT_TYPES", "news,music"),
            ("FLUSH_INTERVAL", "250ms"),
            ("RATE_LIMIT_PER_SECOND", "2.5"),
            ("RATE_LIMIT_BURST", "10"),
            ("SURREAL_NS", "test"),
        ])
        .unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(config.host, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(settings.catalog.len(), 2);
        assert!(settings.catalog.get("music").is_some());
        assert_eq!(settings.flush_interval, Duration::from_millis(250));
        assert_eq!(settings.rate_limit.refill_per_second, 2.5);
        assert_eq!(settings.rate_limit.burst, 10);
        assert_eq!(config.database.namespace, "test");
    }

    #[test]
    fn loading_defers_validation_to_settings() {
        let config = from_pairs(&[("RATE_LIMIT_BURST", "0"), ("FLUSH_INTERVAL", "0s")]).unwrap();

        assert_eq!(config.rate_limit_burst, 0);
        assert!(matches!(config.settings(), Err(ConfigError::RateLimit { .. })));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = Config {
            rate_limit_burst: 0,
            ..Config::default()
        };
        assert!(matches!(config.settings(), Err(ConfigError::RateLimit { .. })));

        let config = Config {
            flush_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(config.settings(), Err(ConfigError::ZeroFlushInterval)));

        let config = Config {
            processing_failure_rate: 2.0,
            ..Config::default()
        };
        assert!(matches!(config.settings(), Err(ConfigError::Processing { .. })));
    }
}
