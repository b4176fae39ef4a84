//! Field directives.
//!
//! Each documentation field is parsed into a [`Directive`] on its own,
//! without looking at any registry:
//!
//! | Field | Directive |
//! |-------|-----------|
//! | `:response: json` | [`Directive::Response`] |
//! | `:plugin: json_p token` | [`Directive::Plugins`] |
//! | `:raise id_not_exist: Record does not exist.` | [`Directive::Raise`] |
//! | `:param Int * area_id: area id` | [`Directive::Param`] |
//! | anything else | [`Directive::Attribute`] |
//!
//! Resolving names against the registries happens in
//! [`ContractBuilder::apply`](crate::ContractBuilder::apply).

use crate::error::DirectiveError;
use std::fmt;

/// A parameter type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// `Name`
    Simple(String),
    /// `Outer[Inner]`
    Composite {
        /// The generic type.
        outer: String,
        /// The element type.
        inner: String,
    },
}

impl TypeSpec {
    /// Parses a type expression.
    ///
    /// # Example
    ///
    /// ```
    /// use docket_element::TypeSpec;
    ///
    /// assert_eq!(TypeSpec::parse("Int").unwrap(), TypeSpec::Simple("Int".into()));
    /// assert_eq!(
    ///     TypeSpec::parse("List[Int]").unwrap(),
    ///     TypeSpec::Composite { outer: "List".into(), inner: "Int".into() }
    /// );
    /// assert!(TypeSpec::parse("List[").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self, DirectiveError> {
        let malformed = || DirectiveError::MalformedType {
            spec: spec.to_string(),
        };
        let Some(open) = spec.find('[') else {
            if spec.is_empty() || spec.contains(']') {
                return Err(malformed());
            }
            return Ok(Self::Simple(spec.to_string()));
        };
        let outer = &spec[..open];
        let inner = spec[open + 1..].strip_suffix(']').ok_or_else(malformed)?;
        if outer.is_empty() || inner.is_empty() || outer.contains(']') {
            return Err(malformed());
        }
        if inner.contains('[') || inner.contains(']') {
            return Err(DirectiveError::CompositeInner {
                outer: outer.to_string(),
                inner: inner.to_string(),
            });
        }
        Ok(Self::Composite {
            outer: outer.to_string(),
            inner: inner.to_string(),
        })
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(name) => f.write_str(name),
            Self::Composite { outer, inner } => write!(f, "{outer}[{inner}]"),
        }
    }
}

/// A parsed `param` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDirective {
    /// The declared type.
    pub type_spec: TypeSpec,
    /// `true` when the type is followed by `*`.
    pub required: bool,
    /// Parameter name.
    pub name: String,
    /// Field body.
    pub description: String,
}

/// One parsed documentation field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `:response: <name>`
    Response(String),
    /// `:plugin: <key> <key> ...`
    Plugins(Vec<String>),
    /// `:raise <code>: <message>`
    Raise {
        /// The code.
        code: String,
        /// The field body.
        message: String,
    },
    /// `:param <type> [*] <name>: <description>`
    Param(ParamDirective),
    /// Any other field.
    Attribute {
        /// The field name.
        name: String,
        /// The field body.
        value: String,
    },
}

/// Parses one field.
pub fn parse_field(name: &str, body: &str) -> Result<Directive, DirectiveError> {
    let missing = || DirectiveError::MissingValue {
        field: name.to_string(),
    };
    let body = body.trim();

    if name == "response" {
        if body.is_empty() {
            return Err(missing());
        }
        return Ok(Directive::Response(body.to_string()));
    }
    if name == "plugin" {
        let keys: Vec<String> = body.split_whitespace().map(str::to_string).collect();
        if keys.is_empty() {
            return Err(missing());
        }
        return Ok(Directive::Plugins(keys));
    }
    if let Some(code) = name.strip_prefix("raise ") {
        let code = code.trim();
        if code.is_empty() {
            return Err(missing());
        }
        return Ok(Directive::Raise {
            code: code.to_string(),
            message: body.to_string(),
        });
    }
    if let Some(spec) = name.strip_prefix("param ") {
        return parse_param(name, spec, body).map(Directive::Param);
    }
    Ok(Directive::Attribute {
        name: name.to_string(),
        value: body.to_string(),
    })
}

/// Parses `<type> [*] <name>`; `Type*` is accepted for `Type *`.
fn parse_param(field: &str, spec: &str, body: &str) -> Result<ParamDirective, DirectiveError> {
    let items: Vec<&str> = spec.split_whitespace().collect();
    let missing_name = || DirectiveError::MissingParamName {
        field: field.to_string(),
    };

    let (type_token, required, name) = match items.as_slice() {
        [] => {
            return Err(DirectiveError::MalformedParam {
                field: field.to_string(),
            })
        }
        [_] | [_, "*"] => return Err(missing_name()),
        [ty, name] => match ty.strip_suffix('*') {
            Some(ty) => (ty, true, *name),
            None => (*ty, false, *name),
        },
        [ty, "*", name] => (*ty, true, *name),
        _ => {
            return Err(DirectiveError::MalformedParam {
                field: field.to_string(),
            })
        }
    };

    Ok(ParamDirective {
        type_spec: TypeSpec::parse(type_token)?,
        required,
        name: name.to_string(),
        description: body.to_string(),
    })
}
