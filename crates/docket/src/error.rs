//! Application wiring and routing errors.

use docket_config::ConfigError;
use docket_core::RegistryError;
use docket_element::CompileError;
use docket_telemetry::TelemetryError;
use http::Method;
use thiserror::Error;

/// Errors raised while wiring an [`Application`](crate::Application).
///
/// All of them are startup failures; none occur while serving requests.
#[derive(Error, Debug)]
pub enum AppError {
    /// A type, plugin or response type could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A route's documentation block does not compile.
    #[error("route {path}: {source}")]
    Compile {
        /// The route path.
        path: String,
        /// The compiler error.
        #[source]
        source: CompileError,
    },

    /// A route was declared without methods.
    #[error("route {path} declares no methods")]
    NoMethods {
        /// The route path.
        path: String,
    },

    /// Two routes claim the same path and method.
    #[error("duplicate route {method} {path}")]
    DuplicateRoute {
        /// The route path.
        path: String,
        /// The HTTP method.
        method: Method,
    },

    /// A configured plugin names a kind no factory is registered for.
    #[error("plugin '{key}': unknown kind '{kind}'")]
    UnknownPluginKind {
        /// The plugin key.
        key: String,
        /// The requested kind.
        kind: String,
    },

    /// A plugin factory rejected its settings.
    #[error("plugin '{key}': {source}")]
    PluginFactory {
        /// The plugin key.
        key: String,
        /// The factory's error.
        #[source]
        source: anyhow::Error,
    },

    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics failed to initialize.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Why a request could not be routed to a contract.
///
/// Transports map these to their own "not found" and "method not allowed"
/// responses; a routed request always ends in an envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No route has this path.
    #[error("no route for {path}")]
    NotFound {
        /// The requested path.
        path: String,
    },

    /// The path exists but not for this method.
    #[error("{method} not allowed for {path}")]
    MethodNotAllowed {
        /// The requested path.
        path: String,
        /// The requested method.
        method: Method,
        /// Methods the path accepts.
        allowed: Vec<Method>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AppError::DuplicateRoute {
            path: "/user".into(),
            method: Method::GET,
        };
        assert_eq!(err.to_string(), "duplicate route GET /user");

        let err = AppError::UnknownPluginKind {
            key: "auth".into(),
            kind: "oauth".into(),
        };
        assert_eq!(err.to_string(), "plugin 'auth': unknown kind 'oauth'");

        let err = RouteError::MethodNotAllowed {
            path: "/user".into(),
            method: Method::DELETE,
            allowed: vec![Method::GET],
        };
        assert_eq!(err.to_string(), "DELETE not allowed for /user");
    }

    #[test]
    fn test_registry_error_is_transparent() {
        let err: AppError = RegistryError::DuplicatePlugin { key: "token".into() }.into();
        assert_eq!(err.to_string(), "plugin already registered: token");
    }
}
