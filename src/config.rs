//! # Engine Configuration
//!
//! Layered configuration for the derivation engine, built with the `config`
//! crate. Later sources override earlier ones:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables prefixed `DERIVATION__`, with `__` between
//!    nested keys
//!
//! ```text
//! DERIVATION__REFERENCE_CURRENCY=USD
//! DERIVATION__TARGET_CURRENCIES=USD,CAD,EUR
//! DERIVATION__FX__ENDPOINT=https://rates.example.com/v1/rates
//! DERIVATION__FX__API_KEY=...
//! DERIVATION__RETRY__MAX_ATTEMPTS=3
//! DERIVATION__LOG__FORMAT=json
//! ```
//!
//! [`EngineConfig::pipeline_config`] validates the raw values into the
//! typed [`PipelineConfig`] handed to the pipeline at construction.

use crate::application::services::derivation_pipeline::PipelineConfig;
use crate::application::services::retry::RetryPolicy;
use crate::domain::value_objects::CurrencyCode;
use crate::infrastructure::fx::HttpFxRateProvider;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DERIVATION";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is present but unusable.
    #[error("invalid configuration value for {key}: {message}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// Single-line human-readable output.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        };
        write!(f, "{s}")
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid(
                "log.format",
                format!("expected pretty, compact or json, got {other:?}"),
            )),
        }
    }
}

/// FX provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxSettings {
    /// Rates endpoint URL.
    pub endpoint: Option<String>,
    /// Bearer token for the endpoint.
    pub api_key: Option<String>,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for FxSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: 5_000,
        }
    }
}

/// Retry settings for the FX provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts including the first call.
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single delay in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Raw engine configuration as read from files and environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reference currency for rate tables.
    pub reference_currency: String,
    /// Default conversion targets.
    pub target_currencies: Vec<String>,
    /// Width of an FX retrieval bucket in seconds.
    pub rate_bucket_secs: u64,
    /// FX provider settings.
    pub fx: FxSettings,
    /// Retry settings.
    pub retry: RetrySettings,
    /// Logging settings.
    pub log: LogSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_currency: "USD".to_string(),
            target_currencies: vec!["USD".to_string(), "CAD".to_string()],
            rate_bucket_secs: 300,
            fx: FxSettings::default(),
            retry: RetrySettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Loads defaults, then `path` if given, then `DERIVATION__*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if the file is missing or a value has the
    /// wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder.add_source(env).build()?;
        let loaded: Self = config.try_deserialize()?;
        tracing::debug!(
            reference = %loaded.reference_currency,
            targets = ?loaded.target_currencies,
            "configuration loaded"
        );
        Ok(loaded)
    }

    /// Validates the configuration into a [`PipelineConfig`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for unparseable currency codes, an
    /// empty target list, zero attempts, or a zero timeout or bucket width.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let reference_currency = CurrencyCode::new(&self.reference_currency)
            .map_err(|e| ConfigError::invalid("reference_currency", e.to_string()))?;

        let target_currencies = self
            .target_currencies
            .iter()
            .filter(|code| !code.trim().is_empty())
            .map(|code| {
                CurrencyCode::new(code)
                    .map_err(|e| ConfigError::invalid("target_currencies", e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if target_currencies.is_empty() {
            return Err(ConfigError::invalid(
                "target_currencies",
                "at least one target currency is required",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.fx.timeout_ms == 0 {
            return Err(ConfigError::invalid("fx.timeout_ms", "must be positive"));
        }
        if self.rate_bucket_secs == 0 {
            return Err(ConfigError::invalid("rate_bucket_secs", "must be positive"));
        }

        Ok(PipelineConfig {
            reference_currency,
            target_currencies,
            retry: RetryPolicy::new(
                self.retry.max_attempts,
                Duration::from_millis(self.retry.initial_backoff_ms),
                Duration::from_millis(self.retry.max_backoff_ms),
            ),
            attempt_timeout: Duration::from_millis(self.fx.timeout_ms),
            rate_bucket_secs: self.rate_bucket_secs,
        })
    }

    /// Builds the HTTP FX provider from the `fx` settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if no endpoint is configured or the
    /// HTTP client cannot be built.
    pub fn http_provider(&self) -> Result<HttpFxRateProvider, ConfigError> {
        let endpoint = self
            .fx
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| ConfigError::invalid("fx.endpoint", "no FX endpoint configured"))?;
        HttpFxRateProvider::new(endpoint, self.fx.api_key.clone(), self.fx.timeout_ms)
            .map_err(|e| ConfigError::invalid("fx", e.to_string()))
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("target_currencies")
        .try_parsing(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        environment().source(Some(source))
    }

    mod loading {
        use super::*;

        #[test]
        fn defaults_without_sources() {
            let config = EngineConfig::load_with(None, env(&[])).unwrap();
            assert_eq!(config, EngineConfig::default());

            let pipeline = config.pipeline_config().unwrap();
            assert_eq!(pipeline.reference_currency, CurrencyCode::USD);
            assert_eq!(
                pipeline.target_currencies,
                vec![CurrencyCode::USD, CurrencyCode::CAD]
            );
            assert_eq!(pipeline.retry.max_attempts(), 3);
            assert_eq!(pipeline.retry.initial_backoff(), Duration::from_millis(200));
            assert_eq!(pipeline.retry.max_backoff(), Duration::from_secs(2));
            assert_eq!(pipeline.attempt_timeout, Duration::from_secs(5));
            assert_eq!(pipeline.rate_bucket_secs, 300);
        }

        #[test]
        fn environment_overrides_defaults() {
            let config = EngineConfig::load_with(
                None,
                env(&[
                    ("DERIVATION__REFERENCE_CURRENCY", "cad"),
                    ("DERIVATION__TARGET_CURRENCIES", "USD,EUR,GBP"),
                    ("DERIVATION__RETRY__MAX_ATTEMPTS", "5"),
                    ("DERIVATION__FX__ENDPOINT", "http://localhost:9000/rates"),
                    ("DERIVATION__LOG__FORMAT", "json"),
                ]),
            )
            .unwrap();

            assert_eq!(config.retry.max_attempts, 5);
            assert_eq!(config.log.format, LogFormat::Json);
            assert_eq!(config.fx.endpoint.as_deref(), Some("http://localhost:9000/rates"));

            let pipeline = config.pipeline_config().unwrap();
            assert_eq!(pipeline.reference_currency, CurrencyCode::CAD);
            assert_eq!(
                pipeline.target_currencies,
                vec![CurrencyCode::USD, CurrencyCode::EUR, CurrencyCode::GBP]
            );
        }

        #[test]
        fn missing_file_is_an_error() {
            let result = EngineConfig::load_with(
                Some(Path::new("/nonexistent/derivation.toml")),
                env(&[]),
            );
            assert!(matches!(result, Err(ConfigError::Load(_))));
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn rejects_bad_currency() {
            let config = EngineConfig {
                reference_currency: "US".to_string(),
                ..EngineConfig::default()
            };
            let err = config.pipeline_config().unwrap_err();
            assert!(err.to_string().contains("reference_currency"));
        }

        #[test]
        fn rejects_empty_targets() {
            let config = EngineConfig {
                target_currencies: vec![" ".to_string()],
                ..EngineConfig::default()
            };
            assert!(config.pipeline_config().is_err());
        }

        #[test]
        fn rejects_zero_attempts_and_timeouts() {
            let mut config = EngineConfig::default();
            config.retry.max_attempts = 0;
            assert!(config.pipeline_config().is_err());

            let mut config = EngineConfig::default();
            config.fx.timeout_ms = 0;
            assert!(config.pipeline_config().is_err());

            let config = EngineConfig {
                rate_bucket_secs: 0,
                ..EngineConfig::default()
            };
            assert!(config.pipeline_config().is_err());
        }

        #[test]
        fn http_provider_requires_endpoint() {
            let config = EngineConfig::default();
            assert!(config.http_provider().is_err());

            let mut config = EngineConfig::default();
            config.fx.endpoint = Some("http://localhost/rates".to_string());
            assert_eq!(
                config.http_provider().unwrap().endpoint(),
                "http://localhost/rates"
            );
        }
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
    }
}
