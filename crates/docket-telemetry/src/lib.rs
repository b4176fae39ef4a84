//! Logging and metrics for Docket services.
//!
//! - **Logging**: `tracing-subscriber` with an env filter, JSON or pretty output
//! - **Metrics**: `metrics` facade with a Prometheus recorder
//!
//! The pipeline records every dispatch through [`metrics::record_dispatch`]
//! whether or not a recorder is installed; installing one with
//! [`init_telemetry`] makes the numbers visible.
//!
//! # Example
//!
//! ```rust,ignore
//! use docket_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::development())?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem's [`TelemetryError`].
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
