//! Telemetry setup errors.

use thiserror::Error;

/// Why logging or metrics could not be installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive does not parse.
    #[error("invalid log filter '{directive}': {reason}")]
    Filter {
        /// The directive as configured.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("cannot install log subscriber: {0}")]
    Subscriber(String),

    /// Histogram buckets were rejected.
    #[error("invalid histogram buckets: {0}")]
    Buckets(String),

    /// The metrics listener address does not parse.
    #[error("invalid metrics address '{addr}': {reason}")]
    Address {
        /// The address as configured.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// A metrics recorder is already installed, or the listener failed.
    #[error("cannot install metrics recorder: {0}")]
    Recorder(String),
}
