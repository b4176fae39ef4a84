//! Telemetry settings derived from [`DocketConfig`].

use docket_config::{DocketConfig, LogFormat};
use docket_telemetry::{LogConfig, MetricsConfig, TelemetryConfig, TelemetryResult};

/// Maps the `logging` and `metrics` sections onto telemetry settings.
#[must_use]
pub fn telemetry_config(config: &DocketConfig) -> TelemetryConfig {
    let logging = &config.logging;
    let json = logging.format == LogFormat::Json;
    let log = LogConfig {
        enabled: logging.enabled,
        filter: logging.level.clone(),
        json,
        span_events: !json,
        location: logging.include_location,
        ansi: logging.ansi_enabled,
    };

    let metrics = MetricsConfig {
        enabled: config.metrics.enabled,
        addr: config.metrics.addr.clone(),
        duration_buckets: config.metrics.histogram_buckets.clone(),
    };

    TelemetryConfig::new(log, metrics)
}

/// Installs logging and metrics as configured.
///
/// # Errors
///
/// Fails if a global subscriber or recorder is already installed, or if
/// the log level or metrics address is invalid.
pub fn init_telemetry(config: &DocketConfig) -> TelemetryResult<()> {
    docket_telemetry::init_telemetry(&telemetry_config(config))
}
