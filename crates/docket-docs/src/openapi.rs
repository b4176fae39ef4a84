//! OpenAPI document types and generation.
//!
//! The types follow the OpenAPI 3.1 specification
//! (<https://spec.openapis.org/oas/v3.1.0>), trimmed to what a compiled
//! contract can describe. Docket-specific details travel in `x-` extensions:
//!
//! | Extension | On | Content |
//! |-----------|----|---------|
//! | `x-codes` | operation | the full code table: `code`, `message`, `category` |
//! | `x-plugins` | operation | plugin keys in declaration order |
//! | `x-response` | operation | response type name |
//! | `x-version` | operation | the `version` field, when declared |
//! | `x-origin` | parameter | `handler` or `plugin:<key>` |

use docket_core::code::SUCCESS;
use docket_core::Envelope;
use docket_element::{Contract, ParamSpec};
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{DocsError, DocsResult};

/// An OpenAPI 3.1 document describing every routed contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    /// Always `3.1.0`.
    pub openapi: String,
    /// Set through [`OpenApiGenerator::title`] and friends.
    pub info: Info,
    /// Base URLs the application is served from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// One item per routed path, in route order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,
    /// Endpoint groups, one per distinct name prefix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl OpenApi {
    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> DocsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the operation for a path and method.
    #[must_use]
    pub fn operation(&self, path: &str, method: &Method) -> Option<&Operation> {
        self.paths.get(path)?.operation(method)
    }
}

/// Document title, version and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// Shown as the document title.
    pub title: String,
    /// Version of the application, not of any contract.
    pub version: String,
    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// The URL.
    pub url: String,
    /// What the URL serves, for example `staging`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The operations routed on one path, one slot per method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

impl PathItem {
    /// Returns the operation for `method`.
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            _ => None,
        }
    }

    fn slot(&mut self, method: &Method) -> Option<&mut Option<Operation>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::PUT => Some(&mut self.put),
            Method::POST => Some(&mut self.post),
            Method::DELETE => Some(&mut self.delete),
            Method::OPTIONS => Some(&mut self.options),
            Method::HEAD => Some(&mut self.head),
            Method::PATCH => Some(&mut self.patch),
            _ => None,
        }
    }
}

/// One contract bound to one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// The endpoint name, e.g. `area.get`.
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// The contract title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// The contract description, rendered to HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The endpoint name up to its first `.`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Set by a `deprecated` field.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// The contract's parameters, for methods without a body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// The contract's parameters as one object, for methods with a body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// The envelope, keyed by the status the response type renders.
    pub responses: IndexMap<String, Response>,
    /// `x-codes` (the code table), `x-plugins`, `x-response` and `x-version`.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Where a parameter travels. Docket only emits [`ParameterIn::Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// `?name=value`.
    Query,
    /// A path segment.
    Path,
    /// HTTP header.
    Header,
    /// Cookie.
    Cookie,
}

/// One contract parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// As declared in the `param` field.
    pub name: String,
    /// Always the query string.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// The field body, rendered to HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marked with `*` in the field.
    #[serde(default)]
    pub required: bool,
    /// Derived from the parameter type via [`Schema::for_type`].
    pub schema: Schema,
    /// `x-origin`: `plugin:<key>` for injected parameters, else `handler`.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// The parameters of a body-carrying method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Set when any parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Keyed by media type.
    pub content: IndexMap<String, MediaType>,
}

/// A schema under one media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// The schema.
    pub schema: Schema,
}

/// The rendered envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Required by OpenAPI.
    pub description: String,
    /// Keyed by the response type's content type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// An endpoint group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// The shared endpoint name prefix.
    pub name: String,
}

/// The JSON Schema `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// String type.
    String,
    /// Number type.
    Number,
    /// Integer type.
    Integer,
    /// Boolean type.
    Boolean,
    /// Array type.
    Array,
    /// Object type.
    Object,
}

/// The subset of JSON Schema parameter types map onto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema type; absent means any value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,
    /// Schema format (e.g. "email").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Enum values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "enum")]
    pub enum_values: Vec<Value>,
}

impl Schema {
    fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Create a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::typed(SchemaType::String)
    }

    /// Create an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::typed(SchemaType::Integer)
    }

    /// Create a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::typed(SchemaType::Number)
    }

    /// Create a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::typed(SchemaType::Boolean)
    }

    /// Create an array schema with the given item schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(SchemaType::Array)
        }
    }

    /// Create an object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::typed(SchemaType::Object)
    }

    /// Add a description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add a property to an object schema.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Maps a Docket parameter type name to a schema.
    ///
    /// `List[T]` becomes an array of `T`; types without a JSON Schema
    /// counterpart (`Param`, `Json`, custom types) accept any value and keep
    /// their name in the description.
    #[must_use]
    pub fn for_type(type_name: &str) -> Self {
        if let Some(inner) = type_name
            .strip_prefix("List[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Self::array(Self::for_type(inner));
        }
        match type_name {
            "Int" => Self::integer(),
            "Float" => Self::number(),
            "Str" => Self::string(),
            "Bool" => Self::boolean(),
            "Mail" => Self {
                format: Some("email".to_string()),
                ..Self::string()
            },
            other => Self::default().with_description(other),
        }
    }
}

/// Builds an OpenAPI document from compiled contracts.
///
/// # Example
///
/// ```
/// use docket_core::Registries;
/// use docket_docs::OpenApiGenerator;
/// use docket_element::compile;
/// use http::Method;
///
/// let doc = "Get an area.\n\n:param Int * area_id: the area\n:raise area_gone: Area removed.\n";
/// let contract = compile("area.get", Some(doc), &[Method::GET], &Registries::default()).unwrap();
///
/// let spec = OpenApiGenerator::new()
///     .title("Areas")
///     .generate([("/area", &contract)])
///     .unwrap();
///
/// let op = spec.operation("/area", &Method::GET).unwrap();
/// assert_eq!(op.operation_id, "area.get");
/// assert_eq!(op.parameters[0].name, "area_id");
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenApiGenerator {
    title: Option<String>,
    version: Option<String>,
    description: Option<String>,
    servers: Vec<Server>,
}

impl OpenApiGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a server.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Generates a document from `(path, contract)` routes.
    ///
    /// Each of a contract's methods becomes one operation on its path.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::UnsupportedMethod`] for a method OpenAPI has no
    /// slot for and [`DocsError::DuplicateOperation`] when two routes claim
    /// the same path and method.
    pub fn generate<'a, I>(&self, routes: I) -> DocsResult<OpenApi>
    where
        I: IntoIterator<Item = (&'a str, &'a Contract)>,
    {
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        let mut tags: Vec<Tag> = Vec::new();

        for (path, contract) in routes {
            for method in contract.methods() {
                let operation = convert_operation(contract, method);
                for tag in &operation.tags {
                    if !tags.iter().any(|t| &t.name == tag) {
                        tags.push(Tag { name: tag.clone() });
                    }
                }

                let slot = paths
                    .entry(path.to_string())
                    .or_default()
                    .slot(method)
                    .ok_or_else(|| DocsError::UnsupportedMethod {
                        endpoint: contract.endpoint().to_string(),
                        method: method.clone(),
                    })?;
                if slot.is_some() {
                    return Err(DocsError::DuplicateOperation {
                        path: path.to_string(),
                        method: method.clone(),
                    });
                }
                *slot = Some(operation);
            }
        }

        Ok(OpenApi {
            openapi: "3.1.0".to_string(),
            info: Info {
                title: self.title.clone().unwrap_or_else(|| "Docket API".to_string()),
                version: self.version.clone().unwrap_or_else(|| "0.0.0".to_string()),
                description: self.description.clone(),
            },
            servers: self.servers.clone(),
            paths,
            tags,
        })
    }
}

/// Methods whose parameters travel in the request body.
fn has_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn convert_operation(contract: &Contract, method: &Method) -> Operation {
    let (parameters, request_body) = if has_body(method) {
        (Vec::new(), Some(request_body(contract)))
    } else {
        (contract.params().iter().map(query_parameter).collect(), None)
    };

    let mut extensions = IndexMap::new();
    extensions.insert(
        "x-codes".to_string(),
        Value::Array(
            contract
                .codes()
                .iter()
                .map(|entry| {
                    json!({
                        "code": entry.code,
                        "message": entry.message,
                        "category": entry.category.to_string(),
                    })
                })
                .collect(),
        ),
    );
    if !contract.plugin_keys().is_empty() {
        extensions.insert("x-plugins".to_string(), json!(contract.plugin_keys()));
    }
    extensions.insert("x-response".to_string(), json!(contract.response().name()));
    if let Some(version) = contract.version() {
        extensions.insert("x-version".to_string(), json!(version));
    }

    let tag = contract
        .endpoint()
        .split_once('.')
        .map_or(contract.endpoint(), |(group, _)| group);

    Operation {
        operation_id: contract.endpoint().to_string(),
        summary: non_empty(contract.title()),
        description: non_empty(contract.description()),
        tags: vec![tag.to_string()],
        deprecated: contract.is_deprecated(),
        parameters,
        request_body,
        responses: responses(contract),
        extensions,
    }
}

fn query_parameter(spec: &ParamSpec) -> Parameter {
    let mut extensions = IndexMap::new();
    extensions.insert("x-origin".to_string(), json!(spec.origin.to_string()));
    Parameter {
        name: spec.name.clone(),
        location: ParameterIn::Query,
        description: non_empty(&spec.description),
        required: spec.required,
        schema: Schema::for_type(spec.type_name()),
        extensions,
    }
}

fn request_body(contract: &Contract) -> RequestBody {
    let mut schema = Schema::object();
    for spec in contract.params() {
        let mut property = Schema::for_type(spec.type_name());
        if !spec.description.is_empty() {
            property.description = Some(spec.description.clone());
        }
        schema.properties.insert(spec.name.clone(), property);
    }
    schema.required = contract.required().to_vec();

    let mut content = IndexMap::new();
    for media in ["application/x-www-form-urlencoded", "application/json"] {
        content.insert(
            media.to_string(),
            MediaType {
                schema: schema.clone(),
            },
        );
    }
    RequestBody {
        required: !contract.required().is_empty(),
        content,
    }
}

/// One response describing the envelope, keyed by the status the response
/// type gives a successful envelope.
fn responses(contract: &Contract) -> IndexMap<String, Response> {
    let sample = contract.response().render(&Envelope::new(SUCCESS));

    let mut code = Schema::string();
    code.enum_values = contract
        .code_index()
        .into_iter()
        .map(|c| Value::String(c.to_string()))
        .collect();
    let mut envelope = Schema::object()
        .property("code", code)
        .property("message", Schema::string())
        .property("data", Schema::default());
    envelope.required = vec!["code".to_string()];

    let mut content = IndexMap::new();
    content.insert(sample.content_type, MediaType { schema: envelope });

    let mut responses = IndexMap::new();
    responses.insert(
        sample.status.as_u16().to_string(),
        Response {
            description: "Response envelope; see `x-codes` for every code".to_string(),
            content,
        },
    );
    responses
}
