//! Registration errors.

use thiserror::Error;

/// Errors raised while registering types, plugins or response types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A type with this name is already registered.
    #[error("parameter type already registered: {name}")]
    DuplicateType {
        /// The type name.
        name: String,
    },

    /// A plugin with this key is already registered.
    #[error("plugin already registered: {key}")]
    DuplicatePlugin {
        /// The plugin key.
        key: String,
    },

    /// A response type with this name is already registered.
    #[error("response type already registered: {name}")]
    DuplicateResponse {
        /// The response type name.
        name: String,
    },

    /// A name cannot be used as a registry key.
    #[error("invalid registry key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl RegistryError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
