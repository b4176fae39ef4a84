//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("no configuration file at {}", path.display())]
    NotFound {
        /// The requested path.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read {}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format '{format}' (expected toml or json)")]
    UnsupportedFormat {
        /// The format or file name that was given.
        format: String,
    },

    /// Malformed TOML or an unknown key.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON or an unknown key.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file exists but does not parse.
    #[error("invalid .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A value loaded fine but is not usable.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted path of the offending value, e.g. `plugins.token.kind`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable has an unknown key or an unparsable value.
    #[error("environment override {var}: {reason}")]
    Env {
        /// The variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Dotted path of the offending value, for [`Invalid`](Self::Invalid).
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConfigError::NotFound {
            path: "/etc/docket/docket.toml".into(),
        };
        assert_eq!(err.to_string(), "no configuration file at /etc/docket/docket.toml");

        let err = ConfigError::invalid("responses.default", "must not be empty");
        assert_eq!(err.to_string(), "responses.default: must not be empty");
        assert_eq!(err.field(), Some("responses.default"));

        let err = ConfigError::env("DOCKET__METRICS__ENABLED", "expected a boolean");
        assert_eq!(
            err.to_string(),
            "environment override DOCKET__METRICS__ENABLED: expected a boolean"
        );
        assert_eq!(err.field(), None);
    }
}
