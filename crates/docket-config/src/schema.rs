//! Configuration schema types.
//!
//! Every section rejects unknown fields, so a typo in a config file fails
//! loading instead of being silently ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Service identification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name, used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Deployment environment (e.g. "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            environment: default_environment(),
        }
    }
}

fn default_service_name() -> String {
    "docket-service".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. "info" or "docket_pipeline=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install a Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Address for the Prometheus endpoint; unset keeps metrics in-process.
    #[serde(default)]
    pub addr: Option<String>,

    /// Histogram bucket boundaries for dispatch duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: None,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

/// Response type selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResponsesConfig {
    /// Name of the response type used by contracts without a `response`
    /// directive.
    #[serde(default = "default_response")]
    pub default: String,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            default: default_response(),
        }
    }
}

fn default_response() -> String {
    "json".to_string()
}

/// A plugin instance declared in configuration.
///
/// The table key is the plugin key used in `:plugin:` directives; `kind`
/// selects the factory that builds it.
///
/// ```toml
/// [plugins.token]
/// kind = "token"
/// settings = { secret = "s3cret" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Factory name.
    pub kind: String,

    /// Factory-specific settings.
    #[serde(default)]
    pub settings: Value,
}

impl PluginConfig {
    /// Creates a plugin entry without settings.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            settings: Value::Null,
        }
    }

    /// Sets the factory settings.
    #[must_use]
    pub fn settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    /// Returns a string setting.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), r#""json""#);
    }

    #[test]
    fn test_logging_rejects_unknown_fields() {
        let result: Result<LoggingConfig, _> = toml::from_str("level = \"info\"\ncolour = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_section_defaults() {
        let logging: LoggingConfig = toml::from_str("").unwrap();
        assert_eq!(logging, LoggingConfig::default());

        let metrics: MetricsConfig = toml::from_str("enabled = true").unwrap();
        assert!(metrics.enabled);
        assert!(metrics.addr.is_none());
        assert_eq!(metrics.histogram_buckets.len(), 12);

        assert_eq!(ResponsesConfig::default().default, "json");
    }

    #[test]
    fn test_plugin_settings() {
        let plugin: PluginConfig =
            toml::from_str("kind = \"token\"\nsettings = { secret = \"abc\" }\n").unwrap();
        assert_eq!(plugin.kind, "token");
        assert_eq!(plugin.setting_str("secret"), Some("abc"));
        assert_eq!(plugin.setting_str("missing"), None);

        let bare: PluginConfig = toml::from_str("kind = \"json_p\"").unwrap();
        assert_eq!(bare, PluginConfig::new("json_p"));
    }
}
