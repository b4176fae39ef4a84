//! Prometheus metrics for Docket dispatch.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `docket_requests_total` | Counter | `endpoint`, `code` | Dispatched requests |
//! | `docket_request_duration_seconds` | Histogram | `endpoint` | Dispatch latency |
//! | `docket_rejections_total` | Counter | `endpoint`, `code` | Requests rejected by validation |
//! | `docket_contracts_compiled_total` | Counter | - | Contracts compiled at startup |
//!
//! Recording functions are no-ops until a recorder is installed.
//!
//! # Example
//!
//! ```
//! use docket_telemetry::metrics::record_dispatch;
//! use std::time::Duration;
//!
//! record_dispatch("user.get", "success", Duration::from_millis(3));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Counter of dispatched requests.
pub const REQUESTS_TOTAL: &str = "docket_requests_total";
/// Histogram of dispatch latency.
pub const REQUEST_DURATION: &str = "docket_request_duration_seconds";
/// Counter of validation rejections.
pub const REJECTIONS_TOTAL: &str = "docket_rejections_total";
/// Counter of compiled contracts.
pub const CONTRACTS_COMPILED: &str = "docket_contracts_compiled_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to serve `/metrics` on; `None` keeps metrics in-process,
    /// readable with [`render_metrics`].
    pub addr: Option<String>,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: None,
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder.
///
/// With an `addr` the exporter serves metrics over HTTP and must be called
/// from within a tokio runtime; without one, metrics are rendered on demand
/// through [`render_metrics`].
///
/// # Errors
///
/// Returns [`TelemetryError::Address`] for an unparsable address and
/// [`TelemetryError::Recorder`] if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::Buckets(e.to_string()))?;

    match &config.addr {
        Some(addr) => {
            let socket = addr.parse::<SocketAddr>().map_err(|e| TelemetryError::Address {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
            builder
                .with_http_listener(socket)
                .install()
                .map_err(|e| TelemetryError::Recorder(e.to_string()))?;
        }
        None => {
            let handle = builder
                .install_recorder()
                .map_err(|e| TelemetryError::Recorder(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    describe_metrics();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` unless [`init_metrics`] installed an in-process recorder.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(REQUEST_DURATION, "Dispatch duration in seconds");
    describe_counter!(REJECTIONS_TOTAL, "Requests rejected by parameter validation");
    describe_counter!(CONTRACTS_COMPILED, "Contracts compiled at startup");
}

/// Records a completed dispatch.
pub fn record_dispatch(endpoint: &str, code: &str, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "code" => code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION, "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

/// Records a request rejected before its handler ran.
pub fn record_rejection(endpoint: &str, code: &str) {
    counter!(
        REJECTIONS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}

/// Records compiled contracts.
pub fn record_compiled(count: usize) {
    counter!(CONTRACTS_COMPILED).increment(count as u64);
}
