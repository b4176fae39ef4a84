//! Combined logging and metrics settings.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Logging and metrics settings installed together by
/// [`init_telemetry`](crate::init_telemetry).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryConfig {
    /// Log subscriber settings.
    pub logging: LogConfig,

    /// Prometheus recorder settings.
    pub metrics: MetricsConfig,
}

impl TelemetryConfig {
    /// Pairs logging and metrics settings.
    #[must_use]
    pub fn new(logging: LogConfig, metrics: MetricsConfig) -> Self {
        Self { logging, metrics }
    }

    /// Pretty logs at `debug`, no metrics.
    #[must_use]
    pub fn development() -> Self {
        Self::new(LogConfig::development(), MetricsConfig::default())
    }

    /// JSON logs at `info` and an in-process Prometheus recorder.
    #[must_use]
    pub fn production() -> Self {
        Self::new(
            LogConfig::production(),
            MetricsConfig {
                enabled: true,
                ..MetricsConfig::default()
            },
        )
    }

    /// Serves metrics on `addr` instead of keeping them in-process.
    #[must_use]
    pub fn serve_metrics(mut self, addr: impl Into<String>) -> Self {
        self.metrics.enabled = true;
        self.metrics.addr = Some(addr.into());
        self
    }

    /// Turns logging off, e.g. for tests that install their own subscriber.
    #[must_use]
    pub fn without_logging(mut self) -> Self {
        self.logging.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let dev = TelemetryConfig::development();
        assert!(!dev.logging.json);
        assert!(!dev.metrics.enabled);

        let prod = TelemetryConfig::production();
        assert!(prod.logging.json);
        assert!(prod.metrics.enabled);
        assert!(prod.metrics.addr.is_none());
    }

    #[test]
    fn test_serve_metrics() {
        let config = TelemetryConfig::default()
            .serve_metrics("0.0.0.0:9100")
            .without_logging();
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.addr.as_deref(), Some("0.0.0.0:9100"));
        assert!(!config.logging.enabled);
    }
}
