//! Parameter validation against a compiled contract.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. every required parameter is present (`null` counts as absent)
//! 2. every present declared parameter coerces to its type
//! 3. no raw key falls outside the contract's parameter index

use docket_core::code::{PARAM_MISSING, PARAM_UNKNOWN};
use docket_core::{Envelope, Params, RawParams};
use docket_element::Contract;
use serde_json::{json, Value};
use std::fmt;

/// Why a request was rejected before reaching its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A required parameter is absent.
    Missing {
        /// Parameter name.
        param: String,
    },
    /// A parameter failed its type's coercion.
    Invalid {
        /// Parameter name.
        param: String,
        /// The type's error code.
        code: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A parameter is not declared by the contract.
    Unknown {
        /// Parameter name.
        param: String,
    },
}

impl Rejection {
    /// Returns the response code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Missing { .. } => PARAM_MISSING,
            Self::Invalid { code, .. } => code,
            Self::Unknown { .. } => PARAM_UNKNOWN,
        }
    }

    /// Returns the offending parameter name.
    #[must_use]
    pub fn param(&self) -> &str {
        match self {
            Self::Missing { param } | Self::Invalid { param, .. } | Self::Unknown { param } => {
                param
            }
        }
    }

    /// Builds the response envelope, with the message from the contract's
    /// code table and the parameter name as data.
    #[must_use]
    pub fn into_envelope(self, contract: &Contract) -> Envelope {
        let message = contract.message(self.code()).map(str::to_string);
        let (code, data) = match self {
            Self::Missing { param } => (PARAM_MISSING.to_string(), json!({ "parameter": param })),
            Self::Unknown { param } => (PARAM_UNKNOWN.to_string(), json!({ "parameter": param })),
            Self::Invalid {
                param,
                code,
                reason,
            } => (code, json!({ "parameter": param, "reason": reason })),
        };
        let mut envelope = Envelope::new(code).with_data(data);
        envelope.message = message;
        envelope
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { param } => write!(f, "missing parameter '{param}'"),
            Self::Invalid { param, reason, .. } => write!(f, "invalid parameter '{param}': {reason}"),
            Self::Unknown { param } => write!(f, "unknown parameter '{param}'"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Validates raw parameters.
///
/// On success every declared parameter is present in the returned map, in
/// parameter-index order; absent optional parameters are `null`.
///
/// # Example
///
/// ```
/// use docket_core::{RawParams, Registries};
/// use docket_element::compile;
/// use docket_pipeline::{validate, Rejection};
/// use http::Method;
/// use serde_json::json;
///
/// let doc = "Get an area.\n\n:param Int * area_id:\n";
/// let contract = compile("area.get", Some(doc), &[Method::GET], &Registries::default()).unwrap();
///
/// let mut raw = RawParams::new();
/// raw.insert("area_id".into(), json!("5"));
/// assert_eq!(validate(&contract, &raw).unwrap().int("area_id"), Some(5));
///
/// raw.insert("area".into(), json!("x"));
/// assert_eq!(
///     validate(&contract, &raw).unwrap_err(),
///     Rejection::Unknown { param: "area".into() }
/// );
/// ```
pub fn validate(contract: &Contract, raw: &RawParams) -> Result<Params, Rejection> {
    let present = |name: &str| raw.get(name).filter(|v| !v.is_null());

    if let Some(name) = contract.required().iter().find(|name| present(name).is_none()) {
        return Err(Rejection::Missing {
            param: name.clone(),
        });
    }

    let mut params = Params::new();
    for name in contract.param_index() {
        let Some(spec) = contract.param(name) else {
            continue;
        };
        let value = match present(name) {
            Some(value) => spec.ty.coerce(value).map_err(|mismatch| Rejection::Invalid {
                param: name.clone(),
                code: mismatch.code,
                reason: mismatch.reason,
            })?,
            None => Value::Null,
        };
        params.insert(name.clone(), value);
    }

    if let Some(name) = raw.keys().find(|name| !contract.accepts(name)) {
        return Err(Rejection::Unknown {
            param: name.clone(),
        });
    }
    Ok(params)
}
