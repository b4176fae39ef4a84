//! Export errors.

use http::Method;
use thiserror::Error;

/// Why a set of contracts could not be exported.
#[derive(Debug, Error)]
pub enum DocsError {
    /// The document could not be written as JSON.
    #[error("cannot encode document: {0}")]
    Encode(#[from] serde_json::Error),

    /// OpenAPI has no operation slot for this method (e.g. `CONNECT`).
    #[error("{endpoint}: no OpenAPI operation for method {method}")]
    UnsupportedMethod {
        /// The endpoint name.
        endpoint: String,
        /// The route method.
        method: Method,
    },

    /// Two routes claim the same path and method.
    #[error("{method} {path} is exported twice")]
    DuplicateOperation {
        /// The route path.
        path: String,
        /// The route method.
        method: Method,
    },
}

/// Result type for documentation export.
pub type DocsResult<T> = Result<T, DocsError>;
