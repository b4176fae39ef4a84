//! Per-request state.
//!
//! An [`Invocation`] is created for every dispatch and flows through the
//! plugin chain. Plugins enrich it through the typed [`Extensions`] map; the
//! handler finally receives a [`Request`] built from it.

use http::Method;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Raw request parameters keyed by name, in arrival order.
pub type RawParams = IndexMap<String, Value>;

/// A unique identifier for each request, using UUID v7.
///
/// # Example
///
/// ```
/// use docket_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Type-keyed storage for data plugins attach to a request.
///
/// Values are reference counted, so cloning the map is cheap and the handler
/// sees exactly what the plugins stored.
#[derive(Clone, Default)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.map.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Returns the stored value of type `T`.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns `true` if a value of type `T` is stored.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions").field("len", &self.map.len()).finish()
    }
}

/// Validated parameters handed to a handler.
///
/// Every declared parameter is present; absent optional parameters are
/// `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: IndexMap<String, Value>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns a value, `None` if the name is unknown.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if the parameter is present and not `null`.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_null())
    }

    /// Returns an integer parameter.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Returns a floating-point parameter.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Returns a string parameter.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns a boolean parameter.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns a list parameter.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Deserializes one parameter into `T`.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.get(name).cloned().unwrap_or(Value::Null))
    }

    /// Deserializes all parameters into `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::to_value(&self.values).and_then(serde_json::from_value)
    }

    /// Iterates over names and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// State of one dispatch while it moves through the plugin chain.
#[derive(Debug)]
pub struct Invocation {
    request_id: RequestId,
    endpoint: String,
    method: Method,
    raw: RawParams,
    params: Params,
    extensions: Extensions,
    started_at: Instant,
}

impl Invocation {
    /// Creates an invocation with a fresh request ID.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, method: Method, raw: RawParams) -> Self {
        Self {
            request_id: RequestId::new(),
            endpoint: endpoint.into(),
            method,
            raw,
            params: Params::new(),
            extensions: Extensions::new(),
            started_at: Instant::now(),
        }
    }

    /// Replaces the request ID, e.g. with one supplied by a client.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the raw parameters as received.
    #[must_use]
    pub fn raw(&self) -> &RawParams {
        &self.raw
    }

    /// Returns a raw parameter, treating `null` as absent.
    #[must_use]
    pub fn raw_value(&self, name: &str) -> Option<&Value> {
        self.raw.get(name).filter(|v| !v.is_null())
    }

    /// Returns the validated parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replaces the validated parameters.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Returns the extensions map.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the extensions map mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns when the dispatch started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Builds the handler request from the current state.
    #[must_use]
    pub fn to_request(&self) -> Request {
        Request {
            request_id: self.request_id,
            endpoint: self.endpoint.clone(),
            method: self.method.clone(),
            params: self.params.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

/// What a handler receives.
#[derive(Debug, Clone)]
pub struct Request {
    /// The request ID.
    pub request_id: RequestId,
    /// The endpoint name.
    pub endpoint: String,
    /// The HTTP method.
    pub method: Method,
    /// Validated parameters.
    pub params: Params,
    /// Data attached by plugins.
    pub extensions: Extensions,
}

impl From<Request> for Params {
    fn from(request: Request) -> Self {
        request.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Caller(String);

    #[test]
    fn test_extensions_roundtrip() {
        let mut ext = Extensions::new();
        assert!(ext.get::<Caller>().is_none());

        ext.insert(Caller("alice".into()));
        let cloned = ext.clone();
        assert_eq!(cloned.get::<Caller>(), Some(&Caller("alice".into())));
        assert!(cloned.contains::<Caller>());
        assert_eq!(cloned.len(), 1);
    }

    #[test]
    fn test_params_getters() {
        let params: Params = [
            ("id".to_string(), json!(7)),
            ("name".to_string(), json!("box")),
            ("ids".to_string(), json!([1, 2])),
            ("note".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(params.int("id"), Some(7));
        assert_eq!(params.str("name"), Some("box"));
        assert_eq!(params.list("ids").map(<[Value]>::len), Some(2));
        assert!(!params.is_set("note"));
        assert!(params.get("note").is_some());
        assert!(params.get("missing").is_none());
        assert_eq!(params.parse::<Option<String>>("note").unwrap(), None);
    }

    #[test]
    fn test_params_extract() {
        #[derive(Deserialize)]
        struct Query {
            id: i64,
            name: Option<String>,
        }

        let mut params = Params::new();
        params.insert("id", json!(3));
        params.insert("name", Value::Null);

        let query: Query = params.extract().unwrap();
        assert_eq!(query.id, 3);
        assert!(query.name.is_none());
    }

    #[test]
    fn test_invocation_raw_null_is_absent() {
        let mut raw = RawParams::new();
        raw.insert("token".into(), Value::Null);
        let inv = Invocation::new("user.get", Method::GET, raw);

        assert!(inv.raw_value("token").is_none());
        assert_eq!(inv.endpoint(), "user.get");
    }

    #[test]
    fn test_request_carries_extensions() {
        let mut inv = Invocation::new("e", Method::POST, RawParams::new());
        inv.extensions_mut().insert(Caller("bob".into()));
        let mut params = Params::new();
        params.insert("a", json!(1));
        inv.set_params(params);

        let request = inv.to_request();
        assert_eq!(request.extensions.get::<Caller>(), Some(&Caller("bob".into())));
        assert_eq!(request.request_id, inv.request_id());
        let params: Params = request.into();
        assert_eq!(params.int("a"), Some(1));
    }
}
