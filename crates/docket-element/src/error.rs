//! Compilation errors.

use thiserror::Error;

/// A problem with one documentation field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// A field needs a value but has none.
    #[error("'{field}' needs a value")]
    MissingValue {
        /// The field name.
        field: String,
    },

    /// `response` names an unregistered response type.
    #[error("unknown response type '{name}'")]
    UnknownResponse {
        /// The requested name.
        name: String,
    },

    /// `plugin` names an unregistered plugin.
    #[error("unknown plugin '{key}'")]
    UnknownPlugin {
        /// The requested key.
        key: String,
    },

    /// A `param` field has no parameter name.
    #[error("parameter declaration '{field}' has no name")]
    MissingParamName {
        /// The field name.
        field: String,
    },

    /// A `param` field does not have the `param <type> [*] <name>` shape.
    #[error("malformed parameter declaration '{field}'")]
    MalformedParam {
        /// The field name.
        field: String,
    },

    /// A type expression is neither `Name` nor `Outer[Inner]`.
    #[error("malformed type '{spec}'")]
    MalformedType {
        /// The type expression.
        spec: String,
    },

    /// A type name is not registered.
    #[error("unknown parameter type '{name}'")]
    UnknownType {
        /// The type name.
        name: String,
    },

    /// `Outer[Inner]` was used with a non-generic outer type.
    #[error("type '{name}' does not take an inner type")]
    NotGeneric {
        /// The outer type name.
        name: String,
    },

    /// A generic type was used without an inner type.
    #[error("generic type '{name}' needs an inner type, e.g. {name}[Int]")]
    MissingInnerType {
        /// The generic type name.
        name: String,
    },

    /// The inner type of a composite is itself composite or generic.
    #[error("inner type '{inner}' of '{outer}' must be a simple type")]
    CompositeInner {
        /// The outer type name.
        outer: String,
        /// The inner type expression.
        inner: String,
    },

    /// The route serves a method the parameter type does not support.
    #[error("parameter '{param}' of type {type_name} does not support {method}")]
    UnsupportedMethod {
        /// The parameter name.
        param: String,
        /// The resolved type name.
        type_name: String,
        /// The offending method.
        method: String,
    },

    /// A parameter name was declared twice.
    #[error("parameter '{name}' is declared more than once")]
    DuplicateParam {
        /// The parameter name.
        name: String,
    },
}

/// A [`DirectiveError`] with the field it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {error}")]
pub struct FieldError {
    /// The field name, or `plugin:<key>` for plugin parameters.
    pub field: String,
    /// What went wrong.
    #[source]
    pub error: DirectiveError,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, error: DirectiveError) -> Self {
        Self {
            field: field.into(),
            error,
        }
    }
}

/// Why a contract could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The handler has no documentation block.
    #[error("{endpoint} has no documentation")]
    MissingDocumentation {
        /// The endpoint name.
        endpoint: String,
    },

    /// One or more fields are invalid.
    #[error("{endpoint} has invalid documentation: {}", join(.errors))]
    InvalidDirectives {
        /// The endpoint name.
        endpoint: String,
        /// Every invalid field, in document order.
        errors: Vec<FieldError>,
    },

    /// Indentation nests past [`MAX_DEPTH`](crate::docblock::MAX_DEPTH).
    #[error("{endpoint} has documentation nested deeper than {limit} levels")]
    NestingTooDeep {
        /// The endpoint name.
        endpoint: String,
        /// The nesting limit.
        limit: usize,
    },
}

impl CompileError {
    /// Creates a missing documentation error.
    pub fn missing_documentation(endpoint: impl Into<String>) -> Self {
        Self::MissingDocumentation {
            endpoint: endpoint.into(),
        }
    }

    /// Returns the endpoint the error is about.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::MissingDocumentation { endpoint }
            | Self::InvalidDirectives { endpoint, .. }
            | Self::NestingTooDeep { endpoint, .. } => endpoint,
        }
    }

    /// Returns the field errors, empty unless fields were invalid.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::MissingDocumentation { .. } | Self::NestingTooDeep { .. } => &[],
            Self::InvalidDirectives { errors, .. } => errors,
        }
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directives_message_lists_fields() {
        let err = CompileError::InvalidDirectives {
            endpoint: "user.get".into(),
            errors: vec![
                FieldError::new("plugin", DirectiveError::UnknownPlugin { key: "auth".into() }),
                FieldError::new(
                    "param Date * day",
                    DirectiveError::UnknownType { name: "Date".into() },
                ),
            ],
        };
        assert_eq!(
            err.to_string(),
            "user.get has invalid documentation: plugin: unknown plugin 'auth'; \
             param Date * day: unknown parameter type 'Date'"
        );
        assert_eq!(err.field_errors().len(), 2);
        assert_eq!(err.endpoint(), "user.get");
    }

    #[test]
    fn test_missing_documentation_message() {
        let err = CompileError::missing_documentation("area.get");
        assert_eq!(err.to_string(), "area.get has no documentation");
        assert!(err.field_errors().is_empty());
    }
}
