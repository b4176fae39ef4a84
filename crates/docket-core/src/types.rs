//! Built-in parameter types.
//!
//! | Name | Code | Accepts |
//! |------|------|---------|
//! | `Param` | none | any value, unchanged |
//! | `Int` | `int_invalid` | integers and integer strings |
//! | `Float` | `float_invalid` | numbers and numeric strings |
//! | `Str` | `str_invalid` | strings, numbers and booleans (as text) |
//! | `Bool` | `bool_invalid` | booleans, `0`/`1`, `true`/`false`/`yes`/`no`/`on`/`off` |
//! | `Mail` | `mail_invalid` | e-mail addresses |
//! | `Json` | `json_invalid` | JSON documents (body methods only) |
//! | `List[T]` | `list_invalid` | arrays or comma-separated strings of `T` |
//!
//! A `List[T]` reports its own code for element failures too; the element
//! type's reason is kept.

use crate::code::CodeSpec;
use crate::param_type::{GenericType, ParamType, SharedType, TypeMismatch, BODY_METHODS, DEFAULT_METHODS};
use http::Method;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::{Arc, OnceLock};

macro_rules! simple_code {
    ($fn_name:ident, $code:literal, $message:literal) => {
        fn $fn_name() -> &'static CodeSpec {
            static SPEC: OnceLock<CodeSpec> = OnceLock::new();
            SPEC.get_or_init(|| CodeSpec::new($code, $message))
        }
    };
}

simple_code!(int_code, "int_invalid", "Parameter must be an integer");
simple_code!(float_code, "float_invalid", "Parameter must be a number");
simple_code!(str_code, "str_invalid", "Parameter must be a string");
simple_code!(bool_code, "bool_invalid", "Parameter must be a boolean");
simple_code!(mail_code, "mail_invalid", "Parameter must be an e-mail address");
simple_code!(json_code, "json_invalid", "Parameter must be a JSON document");

fn mismatch(spec: &CodeSpec, reason: impl Into<String>) -> TypeMismatch {
    TypeMismatch::new(spec.code.clone(), reason)
}

/// Untyped base parameter; accepts anything and reports no code.
#[derive(Debug, Clone, Copy, Default)]
pub struct Param;

impl ParamType for Param {
    fn name(&self) -> &str {
        "Param"
    }

    fn code(&self) -> Option<&CodeSpec> {
        None
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        Ok(raw.clone())
    }
}

/// Signed 64-bit integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int;

impl ParamType for Int {
    fn name(&self) -> &str {
        "Int"
    }

    fn code(&self) -> Option<&CodeSpec> {
        Some(int_code())
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        match raw {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| mismatch(int_code(), format!("'{s}' is not an integer"))),
            other => Err(mismatch(int_code(), format!("{other} is not an integer"))),
        }
    }
}

/// Finite floating-point number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Float;

impl ParamType for Float {
    fn name(&self) -> &str {
        "Float"
    }

    fn code(&self) -> Option<&CodeSpec> {
        Some(float_code())
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        let parsed = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| mismatch(float_code(), format!("{raw} is not a number")))
    }
}

/// Text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

impl ParamType for Str {
    fn name(&self) -> &str {
        "Str"
    }

    fn code(&self) -> Option<&CodeSpec> {
        Some(str_code())
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        match raw {
            Value::String(_) => Ok(raw.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(mismatch(str_code(), format!("{other} is not a string"))),
        }
    }
}

/// Boolean flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl ParamType for Bool {
    fn name(&self) -> &str {
        "Bool"
    }

    fn code(&self) -> Option<&CodeSpec> {
        Some(bool_code())
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        let parsed = match raw {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Value::Bool)
            .ok_or_else(|| mismatch(bool_code(), format!("{raw} is not a boolean")))
    }
}

/// E-mail address.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mail;

fn mail_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("valid regex")
    })
}

impl ParamType for Mail {
    fn name(&self) -> &str {
        "Mail"
    }

    fn code(&self) -> Option<&CodeSpec> {
        Some(mail_code())
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        match raw {
            Value::String(s) if mail_pattern().is_match(s.trim()) => {
                Ok(Value::String(s.trim().to_string()))
            }
            other => Err(mismatch(mail_code(), format!("{other} is not an e-mail address"))),
        }
    }
}

/// Structured JSON document; only accepted in request bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl ParamType for Json {
    fn name(&self) -> &str {
        "Json"
    }

    fn code(&self) -> Option<&CodeSpec> {
        Some(json_code())
    }

    fn methods(&self) -> &[Method] {
        &BODY_METHODS
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        match raw {
            Value::String(s) => serde_json::from_str(s)
                .map_err(|e| mismatch(json_code(), format!("invalid JSON: {e}"))),
            other => Ok(other.clone()),
        }
    }
}

/// The `List` type constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct List;

impl List {
    /// Code reported when the value is not list-shaped.
    pub const CODE: &'static str = "list_invalid";
    /// Message template; `{}` is the element type name.
    pub const TEMPLATE: &'static str = "Parameter must be a list of {}";
}

impl GenericType for List {
    fn name(&self) -> &str {
        "List"
    }

    fn code(&self) -> &str {
        Self::CODE
    }

    fn message_template(&self) -> &str {
        Self::TEMPLATE
    }

    fn instantiate(&self, inner: SharedType) -> SharedType {
        Arc::new(ListOf::new(inner))
    }
}

/// `List[T]`: an array, or a comma-separated string, of `T` values.
#[derive(Debug)]
pub struct ListOf {
    name: String,
    code: CodeSpec,
    methods: Vec<Method>,
    inner: SharedType,
}

impl ListOf {
    /// Builds `List[inner]`.
    #[must_use]
    pub fn new(inner: SharedType) -> Self {
        let name = format!("List[{}]", inner.name());
        let code = List.code_spec(inner.name());
        let methods = DEFAULT_METHODS
            .iter()
            .filter(|m| inner.methods().contains(*m))
            .cloned()
            .collect();
        Self {
            name,
            code,
            methods,
            inner,
        }
    }
}

impl ParamType for ListOf {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> Option<&CodeSpec> {
        Some(&self.code)
    }

    fn methods(&self) -> &[Method] {
        &self.methods
    }

    fn coerce(&self, raw: &Value) -> Result<Value, TypeMismatch> {
        let items: Vec<Value> = match raw {
            Value::Array(items) => items.clone(),
            Value::String(s) if s.trim().is_empty() => Vec::new(),
            Value::String(s) => s
                .split(',')
                .map(|part| Value::String(part.trim().to_string()))
                .collect(),
            other => {
                return Err(TypeMismatch::new(
                    self.code.code.clone(),
                    format!("{other} is not a list"),
                ))
            }
        };
        items
            .iter()
            .map(|item| self.inner.coerce(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
            .map_err(|e| TypeMismatch::new(self.code.code.clone(), e.reason))
    }

    fn inner(&self) -> Option<&SharedType> {
        Some(&self.inner)
    }
}
