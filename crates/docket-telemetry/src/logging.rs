//! Structured logging for Docket services.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! JSON (production) or pretty (development) output. Docket's own events
//! carry `endpoint`, `request_id` and `code` fields, so JSON output can be
//! filtered per endpoint downstream.
//!
//! # Example
//!
//! ```rust,ignore
//! use docket_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development().with_filter("docket_pipeline=trace,info"))?;
//! tracing::info!(endpoint = "user.get", "compiled contract");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `docket_pipeline=debug,info`.
    pub filter: String,

    /// One JSON object per event instead of the pretty multi-line format.
    pub json: bool,

    /// Emit an event when a span opens and closes.
    pub span_events: bool,

    /// Record source file and line.
    pub location: bool,

    /// Emit ANSI colors.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Pretty, colored output at `debug` with span events and locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            filter: "debug".to_string(),
            json: false,
            span_events: true,
            location: true,
            ansi: true,
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            filter: "info".to_string(),
            json: true,
            span_events: false,
            location: false,
            ansi: false,
        }
    }

    /// Replaces the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid directive and
/// [`TelemetryError::Subscriber`] if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.filter)?;
    let base = tracing_subscriber::fmt::layer();
    let layer = if config.json {
        base.json()
            .with_span_events(config.span_events())
            .with_file(config.location)
            .with_line_number(config.location)
            .with_ansi(config.ansi)
            .boxed()
    } else {
        base.pretty()
            .with_span_events(config.span_events())
            .with_file(config.location)
            .with_line_number(config.location)
            .with_ansi(config.ansi)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::Filter {
        directive: filter.to_string(),
        reason: e.to_string(),
    })
}
