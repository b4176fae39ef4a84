//! The compiled, immutable contract of one route.
//!
//! A [`Contract`] records everything the pipeline needs to validate a
//! request: the parameter list with types, the plugins to run, the response
//! type, and the ordered table of codes the route may answer with.
//!
//! Contracts are built by [`ContractBuilder`](crate::ContractBuilder) and
//! never change afterwards. [`Contract::describe`] produces a plain,
//! serializable [`ContractDescriptor`] naming types and plugins instead of
//! holding them, which is what documentation export and comparison use.

use docket_core::{CodeTable, ErrorCode, SharedPlugin, SharedResponse, SharedType};
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where a parameter was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamOrigin {
    /// A `param` field of the handler's documentation.
    Handler,
    /// Injected by the plugin registered under this key.
    Plugin(String),
}

impl fmt::Display for ParamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler => f.write_str("handler"),
            Self::Plugin(key) => write!(f, "plugin:{key}"),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name, unique within the contract.
    pub name: String,
    /// Resolved type.
    pub ty: SharedType,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Description rendered as HTML.
    pub description: String,
    /// Who declared it.
    pub origin: ParamOrigin,
}

impl ParamSpec {
    /// Returns the type name, e.g. `List[Int]`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }
}

/// Compiled contract of one route.
pub struct Contract {
    pub(crate) endpoint: String,
    pub(crate) methods: Vec<Method>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) response: SharedResponse,
    pub(crate) plugin_keys: Vec<String>,
    pub(crate) plugins: Vec<SharedPlugin>,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) required: Vec<String>,
    pub(crate) optional: Vec<String>,
    pub(crate) param_index: Vec<String>,
    pub(crate) defaults: IndexMap<String, Value>,
    pub(crate) codes: CodeTable,
    pub(crate) version: Option<String>,
    pub(crate) deprecated: Option<String>,
    pub(crate) extra: IndexMap<String, String>,
}

impl Contract {
    /// Returns the endpoint name.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the route methods the contract was compiled for.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the title (HTML).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description (HTML), empty when there is none.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the bound response type.
    #[must_use]
    pub fn response(&self) -> &SharedResponse {
        &self.response
    }

    /// Returns the plugin keys in execution order.
    #[must_use]
    pub fn plugin_keys(&self) -> &[String] {
        &self.plugin_keys
    }

    /// Returns the plugins in execution order.
    #[must_use]
    pub fn plugins(&self) -> &[SharedPlugin] {
        &self.plugins
    }

    /// Returns every parameter, plugin parameters first.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Returns the names of required parameters.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Returns the names of optional parameters.
    #[must_use]
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// Returns required names followed by optional names.
    #[must_use]
    pub fn param_index(&self) -> &[String] {
        &self.param_index
    }

    /// Returns `true` if `name` is a declared parameter.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.defaults.contains_key(name)
    }

    /// Returns the default of every parameter (`null`).
    #[must_use]
    pub fn defaults(&self) -> &IndexMap<String, Value> {
        &self.defaults
    }

    /// Returns the code table.
    #[must_use]
    pub fn codes(&self) -> &CodeTable {
        &self.codes
    }

    /// Returns the codes in order.
    #[must_use]
    pub fn code_index(&self) -> Vec<&str> {
        self.codes.index()
    }

    /// Returns the entry for a code.
    #[must_use]
    pub fn code(&self, code: &str) -> Option<&ErrorCode> {
        self.codes.get(code)
    }

    /// Returns the message for a code.
    #[must_use]
    pub fn message(&self, code: &str) -> Option<&str> {
        self.codes.message(code)
    }

    /// Returns the `version` attribute.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the `deprecated` attribute.
    #[must_use]
    pub fn deprecated(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    /// Returns `true` if the contract carries a `deprecated` field.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }

    /// Returns fields that are not directives or well-known attributes.
    #[must_use]
    pub fn extra(&self) -> &IndexMap<String, String> {
        &self.extra
    }

    /// Returns a serializable description of the contract.
    #[must_use]
    pub fn describe(&self) -> ContractDescriptor {
        ContractDescriptor {
            endpoint: self.endpoint.clone(),
            methods: self.methods.iter().map(ToString::to_string).collect(),
            title: self.title.clone(),
            description: self.description.clone(),
            response: self.response.name().to_string(),
            plugins: self.plugin_keys.clone(),
            params: self
                .params
                .iter()
                .map(|p| ParamDescriptor {
                    name: p.name.clone(),
                    type_name: p.type_name().to_string(),
                    required: p.required,
                    description: p.description.clone(),
                    origin: p.origin.to_string(),
                })
                .collect(),
            required: self.required.clone(),
            optional: self.optional.clone(),
            param_index: self.param_index.clone(),
            codes: self.codes.clone(),
            version: self.version.clone(),
            deprecated: self.deprecated.clone(),
            extra: self.extra.clone(),
        }
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("endpoint", &self.endpoint)
            .field("methods", &self.methods)
            .field("response", &self.response.name())
            .field("plugins", &self.plugin_keys)
            .field("params", &self.param_index)
            .field("codes", &self.codes.index())
            .finish_non_exhaustive()
    }
}

/// Serializable form of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Parameter name.
    pub name: String,
    /// Type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether it is required.
    pub required: bool,
    /// Description (HTML).
    pub description: String,
    /// `handler` or `plugin:<key>`.
    pub origin: String,
}

/// Serializable form of a [`Contract`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    /// Endpoint name.
    pub endpoint: String,
    /// Route methods.
    pub methods: Vec<String>,
    /// Title (HTML).
    pub title: String,
    /// Description (HTML).
    pub description: String,
    /// Response type name.
    pub response: String,
    /// Plugin keys in order.
    pub plugins: Vec<String>,
    /// Parameters in order.
    pub params: Vec<ParamDescriptor>,
    /// Required names.
    pub required: Vec<String>,
    /// Optional names.
    pub optional: Vec<String>,
    /// Required then optional names.
    pub param_index: Vec<String>,
    /// Codes in order.
    pub codes: CodeTable,
    /// `version` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `deprecated` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    /// Other attributes.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, String>,
}
