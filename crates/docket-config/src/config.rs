//! Main configuration types.
//!
//! This module provides the top-level [`DocketConfig`] struct and its builder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, MetricsConfig, PluginConfig, ResponsesConfig, ServiceConfig};

/// Complete Docket application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use docket_config::DocketConfig;
///
/// let config = DocketConfig::default();
/// assert_eq!(config.responses.default, "json");
/// assert!(config.plugins.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DocketConfig {
    /// Service identification.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Response type selection.
    #[serde(default)]
    pub responses: ResponsesConfig,

    /// Plugins by key, in declaration order.
    #[serde(default)]
    pub plugins: IndexMap<String, PluginConfig>,
}

impl DocketConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use docket_config::{DocketConfig, PluginConfig};
    ///
    /// let config = DocketConfig::builder()
    ///     .plugin("json_p", PluginConfig::new("json_p"))
    ///     .build();
    ///
    /// assert!(config.plugins.contains_key("json_p"));
    /// ```
    #[must_use]
    pub fn builder() -> DocketConfigBuilder {
        DocketConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - The service name or log level is empty
    /// - The metrics address is not a socket address
    /// - Histogram buckets are empty or not strictly increasing
    /// - The default response name is empty
    /// - A plugin key is not a valid registry key, or its kind is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.name.trim().is_empty() {
            return Err(ConfigError::invalid("service.name", "must not be empty"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }

        if self.metrics.enabled {
            if let Some(addr) = &self.metrics.addr {
                if addr.parse::<std::net::SocketAddr>().is_err() {
                    return Err(ConfigError::invalid(
                        "metrics.addr",
                        format!("invalid socket address: {addr}"),
                    ));
                }
            }
        }

        let buckets = &self.metrics.histogram_buckets;
        if buckets.is_empty() || buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::invalid(
                "metrics.histogram_buckets",
                "must be a non-empty, strictly increasing list",
            ));
        }

        if self.responses.default.trim().is_empty() {
            return Err(ConfigError::invalid("responses.default", "must not be empty"));
        }

        for (key, plugin) in &self.plugins {
            if key.is_empty()
                || key
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | ':'))
            {
                return Err(ConfigError::invalid(
                    format!("plugins.{key}"),
                    "plugin keys must be non-empty without whitespace, brackets or colons",
                ));
            }
            if plugin.kind.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("plugins.{key}.kind"),
                    "must not be empty",
                ));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty logs with ANSI colors and source locations at `debug`.
    ///
    /// # Example
    ///
    /// ```
    /// use docket_config::DocketConfig;
    ///
    /// let config = DocketConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.service.environment = "development".to_string();

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at `info` with metrics enabled.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.metrics.enabled = true;
        config.service.environment = "production".to_string();

        config
    }
}

/// Builder for [`DocketConfig`].
#[derive(Debug, Default)]
pub struct DocketConfigBuilder {
    service: Option<ServiceConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
    responses: Option<ResponsesConfig>,
    plugins: IndexMap<String, PluginConfig>,
}

impl DocketConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service configuration.
    #[must_use]
    pub fn service(mut self, service: ServiceConfig) -> Self {
        self.service = Some(service);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the response configuration.
    #[must_use]
    pub fn responses(mut self, responses: ResponsesConfig) -> Self {
        self.responses = Some(responses);
        self
    }

    /// Add a plugin; a repeated key replaces the earlier entry in place.
    #[must_use]
    pub fn plugin(mut self, key: impl Into<String>, plugin: PluginConfig) -> Self {
        self.plugins.insert(key.into(), plugin);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> DocketConfig {
        DocketConfig {
            service: self.service.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            responses: self.responses.unwrap_or_default(),
            plugins: self.plugins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DocketConfig::default().validate().is_ok());
        assert!(DocketConfig::development().validate().is_ok());
        assert!(DocketConfig::production().validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = DocketConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(dev.logging.ansi_enabled);
        assert!(!dev.metrics.enabled);

        let prod = DocketConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.metrics.enabled);
    }

    #[test]
    fn test_invalid_metrics_addr() {
        let mut config = DocketConfig::default();
        config.metrics.enabled = true;
        config.metrics.addr = Some("nowhere".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metrics.addr"));

        config.metrics.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_histogram_buckets_must_increase() {
        let mut config = DocketConfig::default();
        config.metrics.histogram_buckets = vec![0.1, 0.1];
        assert!(config.validate().is_err());
        config.metrics.histogram_buckets.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plugin_validation() {
        let config = DocketConfig::builder()
            .plugin("bad key", PluginConfig::new("token"))
            .build();
        assert!(config.validate().unwrap_err().to_string().contains("plugins.bad key"));

        let config = DocketConfig::builder().plugin("token", PluginConfig::new(" ")).build();
        assert!(config.validate().unwrap_err().to_string().contains("plugins.token.kind"));
    }

    #[test]
    fn test_builder_keeps_plugin_order() {
        let config = DocketConfig::builder()
            .plugin("token", PluginConfig::new("token"))
            .plugin("json_p", PluginConfig::new("json_p"))
            .build();
        let keys: Vec<&str> = config.plugins.keys().map(String::as_str).collect();
        assert_eq!(keys, ["token", "json_p"]);
    }
}
