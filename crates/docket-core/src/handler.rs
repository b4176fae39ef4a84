//! Handler trait for business logic.
//!
//! A [`Handler`] receives a validated [`Request`] and returns a [`Reply`]. An
//! [`Endpoint`] pairs a handler with the documentation block its contract is
//! compiled from.

use crate::invocation::Request;
use crate::plugin::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Result type returned by handlers.
pub type HandlerResult = anyhow::Result<Reply>;

/// Shared handle to a handler.
pub type SharedHandler = Arc<dyn Handler>;

/// What a handler returns: a code from its contract and optional data.
///
/// # Example
///
/// ```
/// use docket_core::Reply;
/// use serde_json::json;
///
/// let reply = Reply::success().data(json!({"id": 1}));
/// assert_eq!(reply.code, "success");
///
/// let missing = Reply::new("id_not_exist");
/// assert!(missing.message.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Response code; must be declared by the contract.
    pub code: String,
    /// Message overriding the code table's.
    pub message: Option<String>,
    /// Response data.
    pub data: Option<Value>,
}

impl Reply {
    /// A reply with the given code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: None,
            data: None,
        }
    }

    /// A `success` reply.
    #[must_use]
    pub fn success() -> Self {
        Self::new(crate::code::SUCCESS)
    }

    /// Sets the data.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serializes `data` into the reply.
    pub fn json<T: Serialize>(self, data: &T) -> serde_json::Result<Self> {
        Ok(self.data(serde_json::to_value(data)?))
    }

    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Business logic bound to a route.
pub trait Handler: Send + Sync + 'static {
    /// Handles a validated request.
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult>;
}

/// A function-based handler wrapper.
///
/// # Example
///
/// ```
/// use docket_core::{FnHandler, HandlerResult, Params, Reply, Request};
///
/// async fn ping(_params: Params) -> HandlerResult {
///     Ok(Reply::success())
/// }
///
/// let handler = FnHandler::new(|req: Request| ping(req.params));
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Creates a new function-based handler.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.func)(request))
    }
}

/// A named handler with its documentation block.
#[derive(Clone)]
pub struct Endpoint {
    name: String,
    doc: Option<String>,
    handler: SharedHandler,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(name: impl Into<String>, doc: Option<String>, handler: impl Handler) -> Self {
        Self {
            name: name.into(),
            doc,
            handler: Arc::new(handler),
        }
    }

    /// Creates an endpoint from an async function.
    pub fn from_fn<F, Fut>(name: impl Into<String>, doc: impl Into<String>, func: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(name, Some(doc.into()), FnHandler::new(func))
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the documentation block.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    /// Renames the endpoint.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{Invocation, RawParams};
    use http::Method;
    use serde_json::json;

    fn request() -> Request {
        let mut inv = Invocation::new("area.get", Method::GET, RawParams::new());
        let mut params = crate::Params::new();
        params.insert("area_id", json!(5));
        inv.set_params(params);
        inv.to_request()
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler = FnHandler::new(|req: Request| async move {
            let id = req.params.int("area_id").unwrap_or_default();
            Ok::<_, anyhow::Error>(Reply::success().data(json!({"id": id})))
        });

        let reply = handler.call(request()).await.unwrap();
        assert_eq!(reply.data, Some(json!({"id": 5})));
    }

    #[tokio::test]
    async fn test_endpoint_from_fn() {
        let endpoint = Endpoint::from_fn("area.get", "Get an area.", |_req| async {
            Err::<Reply, _>(anyhow::anyhow!("database unavailable"))
        });

        assert_eq!(endpoint.name(), "area.get");
        assert_eq!(endpoint.doc(), Some("Get an area."));
        assert!(endpoint.handler().call(request()).await.is_err());
    }

    #[test]
    fn test_reply_json() {
        #[derive(Serialize)]
        struct Area {
            id: i64,
        }

        let reply = Reply::success().json(&Area { id: 3 }).unwrap().message("done");
        assert_eq!(reply.data, Some(json!({"id": 3})));
        assert_eq!(reply.message.as_deref(), Some("done"));
    }
}
