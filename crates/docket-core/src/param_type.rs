//! Parameter type descriptors.
//!
//! A [`ParamType`] describes how one declared parameter is validated: which
//! HTTP methods it may appear under, how a raw value is coerced, and which
//! error code a failed coercion produces. Composite types such as `List[Int]`
//! are built from a [`GenericType`] constructor and a simple inner type.

use crate::code::CodeSpec;
use http::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a parameter type.
pub type SharedType = Arc<dyn ParamType>;

/// Methods a parameter type accepts unless it says otherwise.
pub static DEFAULT_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Methods that carry a request body.
pub static BODY_METHODS: [Method; 3] = [Method::POST, Method::PUT, Method::PATCH];

/// Returns `true` for methods that never take part in type support checks.
#[must_use]
pub fn is_exempt_method(method: &Method) -> bool {
    *method == Method::HEAD || *method == Method::OPTIONS
}

/// A failed coercion of a raw parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    /// The error code to report.
    pub code: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl TypeMismatch {
    /// Creates a mismatch reporting `code`.
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.reason)
    }
}

impl std::error::Error for TypeMismatch {}

/// Validation and coercion rules for one parameter type.
///
/// # Example
///
/// ```
/// use docket_core::types::Int;
/// use docket_core::ParamType;
/// use serde_json::json;
///
/// let int = Int;
/// assert_eq!(int.coerce(&json!("42")).unwrap(), json!(42));
/// assert_eq!(int.coerce(&json!("forty")).unwrap_err().code, "int_invalid");
/// ```
pub trait ParamType: Send + Sync + fmt::Debug + 'static {
    /// The name used in `param` directives.
    fn name(&self) -> &str;

    /// The error code a failed coercion reports, if the type has one.
    fn code(&self) -> Option<&CodeSpec>;

    /// HTTP methods this type may appear under.
    fn methods(&self) -> &[Method] {
        &DEFAULT_METHODS
    }

    /// Returns `true` if the type may appear under `method`.
    fn supports(&self, method: &Method) -> bool {
        is_exempt_method(method) || self.methods().contains(method)
    }

    /// Coerces a raw value into its validated form.
    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch>;

    /// The element type of a composite type.
    fn inner(&self) -> Option<&SharedType> {
        None
    }

    /// Returns `true` for types built from a [`GenericType`].
    fn is_composite(&self) -> bool {
        self.inner().is_some()
    }
}

/// A type constructor such as `List`.
pub trait GenericType: Send + Sync + fmt::Debug + 'static {
    /// The outer name used in `param` directives.
    fn name(&self) -> &str;

    /// The error code of instantiated types.
    fn code(&self) -> &str;

    /// Message template of instantiated types; `{}` is replaced by the inner name.
    fn message_template(&self) -> &str;

    /// Builds the concrete type for `inner`.
    fn instantiate(&self, inner: SharedType) -> SharedType;

    /// Renders the composite code for a given inner type name.
    fn code_spec(&self, inner_name: &str) -> CodeSpec {
        CodeSpec::new(self.code(), self.message_template().replacen("{}", inner_name, 1))
    }
}

/// A registry entry: either a concrete type or a type constructor.
#[derive(Debug, Clone)]
pub enum TypeEntry {
    /// A type usable directly.
    Simple(SharedType),
    /// A type constructor that needs an inner type.
    Generic(Arc<dyn GenericType>),
}

impl TypeEntry {
    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(ty) => ty.name(),
            Self::Generic(ty) => ty.name(),
        }
    }

    /// Returns `true` for type constructors.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Int, Json};

    #[test]
    fn test_head_and_options_always_supported() {
        let json = Json;
        assert!(!json.supports(&Method::GET));
        assert!(json.supports(&Method::HEAD));
        assert!(json.supports(&Method::OPTIONS));
        assert!(json.supports(&Method::POST));
    }

    #[test]
    fn test_simple_type_is_not_composite() {
        assert!(!Int.is_composite());
        assert!(Int.inner().is_none());
    }

    #[test]
    fn test_mismatch_display() {
        let mismatch = TypeMismatch::new("int_invalid", "not an integer");
        assert_eq!(mismatch.to_string(), "int_invalid: not an integer");
    }
}
