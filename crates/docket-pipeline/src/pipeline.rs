//! Dispatch of one request through a bound contract.
//!
//! ```text
//! raw params ──► plugin 1 ──► plugin 2 ──► … ──► validate ──► handler
//!                                                             │
//! payload ◄── finish (reverse) ◄── render ◄── envelope ◄──────┘
//! ```
//!
//! Plugins wrap the rest of the chain and may short-circuit. Validation
//! failures, handler errors, undeclared reply codes and panics all end in an
//! envelope; dispatch itself never fails.

use crate::validation::validate;
use docket_core::code::EXCEPTION;
use docket_core::{
    BoxFuture, Envelope, Handler, Invocation, JsonResponse, Next, Payload, RawParams, Reply,
    ResponseType, SharedHandler,
};
use docket_element::Contract;
use futures_util::FutureExt;
use http::Method;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A contract bound to its handler.
///
/// Cheap to clone; contract and handler are shared.
///
/// # Example
///
/// ```
/// use docket_core::{Endpoint, RawParams, Registries, Reply, Request};
/// use docket_element::compile;
/// use docket_pipeline::Pipeline;
/// use http::Method;
///
/// # tokio_test::block_on(async {
/// let doc = "Ping.";
/// let contract = compile("ping", Some(doc), &[Method::GET], &Registries::default()).unwrap();
/// let endpoint = Endpoint::from_fn("ping", doc, |_req: Request| async {
///     Ok::<_, anyhow::Error>(Reply::success())
/// });
///
/// let pipeline = Pipeline::new(contract, endpoint.handler().clone());
/// let payload = pipeline.dispatch(Method::GET, RawParams::new()).await;
/// assert_eq!(payload.code, "success");
/// # });
/// ```
#[derive(Clone)]
pub struct Pipeline {
    contract: Arc<Contract>,
    handler: SharedHandler,
}

impl Pipeline {
    /// Binds `handler` to `contract`.
    #[must_use]
    pub fn new(contract: Contract, handler: SharedHandler) -> Self {
        Self::from_shared(Arc::new(contract), handler)
    }

    /// Binds `handler` to an already shared contract.
    #[must_use]
    pub fn from_shared(contract: Arc<Contract>, handler: SharedHandler) -> Self {
        Self { contract, handler }
    }

    /// Returns the contract.
    #[must_use]
    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    /// Dispatches a request with a fresh invocation.
    pub async fn dispatch(&self, method: Method, raw: RawParams) -> Payload {
        let mut inv = Invocation::new(self.contract.endpoint(), method, raw);
        self.process(&mut inv).await
    }

    /// Runs the chain, renders the envelope and applies `finish` hooks.
    pub async fn process(&self, inv: &mut Invocation) -> Payload {
        let envelope = self.execute(inv).await;
        let payload = match panic::catch_unwind(AssertUnwindSafe(|| self.render(inv, &envelope))) {
            Ok(payload) => payload,
            Err(panic) => {
                tracing::error!(
                    endpoint = self.contract.endpoint(),
                    request_id = %inv.request_id(),
                    panic = panic_message(panic.as_ref()),
                    "rendering panicked"
                );
                self.render_exception()
            }
        };

        let elapsed = inv.started_at().elapsed();
        docket_telemetry::metrics::record_dispatch(self.contract.endpoint(), &payload.code, elapsed);
        tracing::debug!(
            endpoint = self.contract.endpoint(),
            request_id = %inv.request_id(),
            code = %payload.code,
            status = payload.status.as_u16(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "dispatched request"
        );
        payload
    }

    /// Renders the envelope and lets plugins adjust the payload.
    fn render(&self, inv: &Invocation, envelope: &Envelope) -> Payload {
        let mut payload = self.contract.response().render(envelope);
        for plugin in self.contract.plugins().iter().rev() {
            plugin.finish(inv, &mut payload);
        }
        payload
    }

    /// Renders the exception envelope without running `finish`.
    ///
    /// Falls back to JSON if the contract's response type panics again.
    fn render_exception(&self) -> Payload {
        let envelope = exception(&self.contract);
        panic::catch_unwind(AssertUnwindSafe(|| self.contract.response().render(&envelope)))
            .unwrap_or_else(|_| JsonResponse.render(&envelope))
    }

    /// Runs plugins, validation and the handler, returning the envelope.
    pub async fn execute(&self, inv: &mut Invocation) -> Envelope {
        let contract = self.contract.clone();
        let handler = self.handler.clone();
        let next = Next::from_plugins(self.contract.plugins(), move |inv| {
            terminal(contract, handler, inv)
        });

        match AssertUnwindSafe(next.run(inv)).catch_unwind().await {
            Ok(envelope) => envelope,
            Err(panic) => {
                tracing::error!(
                    endpoint = self.contract.endpoint(),
                    request_id = %inv.request_id(),
                    panic = panic_message(panic.as_ref()),
                    "request panicked"
                );
                exception(&self.contract)
            }
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

/// End of the plugin chain: validation, then the handler.
fn terminal(
    contract: Arc<Contract>,
    handler: SharedHandler,
    inv: &mut Invocation,
) -> BoxFuture<'static, Envelope> {
    let params = match validate(&contract, inv.raw()) {
        Ok(params) => params,
        Err(rejection) => {
            tracing::warn!(
                endpoint = contract.endpoint(),
                request_id = %inv.request_id(),
                code = rejection.code(),
                reason = %rejection,
                "rejected request"
            );
            docket_telemetry::metrics::record_rejection(contract.endpoint(), rejection.code());
            let envelope = rejection.into_envelope(&contract);
            return Box::pin(async move { envelope });
        }
    };

    inv.set_params(params);
    let request = inv.to_request();
    let request_id = inv.request_id();
    Box::pin(async move {
        match Handler::call(handler.as_ref(), request).await {
            Ok(reply) => reply_envelope(&contract, reply),
            Err(error) => {
                tracing::error!(
                    endpoint = contract.endpoint(),
                    request_id = %request_id,
                    error = %error,
                    "handler failed"
                );
                exception(&contract)
            }
        }
    })
}

/// Maps a reply onto the contract's code table.
fn reply_envelope(contract: &Contract, reply: Reply) -> Envelope {
    let Some(entry) = contract.code(&reply.code) else {
        tracing::error!(
            endpoint = contract.endpoint(),
            code = %reply.code,
            "handler replied with an undeclared code"
        );
        return exception(contract);
    };
    Envelope {
        message: reply.message.or_else(|| Some(entry.message.clone())),
        code: reply.code,
        data: reply.data,
    }
}

fn exception(contract: &Contract) -> Envelope {
    let envelope = Envelope::new(EXCEPTION);
    match contract.message(EXCEPTION) {
        Some(message) => envelope.with_message(message),
        None => envelope,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::{Endpoint, Registries, Request};
    use docket_element::compile;
    use serde_json::json;

    fn pipeline<F, Fut>(doc: &str, func: F) -> Pipeline
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = docket_core::HandlerResult> + Send + 'static,
    {
        pipeline_with(doc, &Registries::default(), func)
    }

    fn pipeline_with<F, Fut>(doc: &str, registries: &Registries, func: F) -> Pipeline
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = docket_core::HandlerResult> + Send + 'static,
    {
        let contract = compile("t", Some(doc), &[Method::GET], registries).unwrap();
        let endpoint = Endpoint::from_fn("t", doc, func);
        Pipeline::new(contract, endpoint.handler().clone())
    }

    #[derive(Debug)]
    struct PanickingFinish;

    impl docket_core::Plugin for PanickingFinish {
        fn name(&self) -> &str {
            "panicking finish"
        }

        fn finish(&self, _inv: &Invocation, _payload: &mut Payload) {
            panic!("finish hook failed");
        }
    }

    #[derive(Debug)]
    struct PanickingResponse;

    impl ResponseType for PanickingResponse {
        fn name(&self) -> &str {
            "broken"
        }

        fn render(&self, _envelope: &Envelope) -> Payload {
            panic!("cannot render");
        }
    }

    #[tokio::test]
    async fn test_success_message_defaults_to_table() {
        let p = pipeline("Echo.\n\n:param Int * n:\n", |req: Request| async move {
            Ok::<_, anyhow::Error>(Reply::success().data(json!({ "n": req.params.int("n") })))
        });
        let mut raw = RawParams::new();
        raw.insert("n".into(), json!("7"));

        let body = p.dispatch(Method::GET, raw).await.json().unwrap();
        assert_eq!(body, json!({"code": "success", "message": "Success", "data": {"n": 7}}));
    }

    #[tokio::test]
    async fn test_reply_message_overrides_table() {
        let p = pipeline("Gone.\n\n:raise gone: Gone.\n", |_req: Request| async {
            Ok::<_, anyhow::Error>(Reply::new("gone").message("Gone since 2020."))
        });
        let envelope = p.execute(&mut Invocation::new("t", Method::GET, RawParams::new())).await;
        assert_eq!(envelope.code, "gone");
        assert_eq!(envelope.message.as_deref(), Some("Gone since 2020."));
    }

    #[tokio::test]
    async fn test_undeclared_code_is_exception() {
        let p = pipeline("Ping.", |_req: Request| async { Ok::<_, anyhow::Error>(Reply::new("teapot")) });
        let payload = p.dispatch(Method::GET, RawParams::new()).await;
        assert_eq!(payload.code, "exception");
    }

    #[tokio::test]
    async fn test_handler_error_is_exception() {
        let p = pipeline("Ping.", |_req: Request| async {
            Err::<Reply, _>(anyhow::anyhow!("database unavailable"))
        });
        let envelope = p.execute(&mut Invocation::new("t", Method::GET, RawParams::new())).await;
        assert_eq!(envelope, Envelope::new("exception").with_message("Unknown exception"));
    }

    #[tokio::test]
    async fn test_panic_is_exception() {
        let p = pipeline("Ping.", |_req: Request| async {
            if true {
                panic!("boom");
            }
            Ok::<_, anyhow::Error>(Reply::success())
        });
        let payload = p.dispatch(Method::GET, RawParams::new()).await;
        assert_eq!(payload.code, "exception");
    }

    #[tokio::test]
    async fn test_finish_panic_is_exception() {
        let mut registries = Registries::default();
        registries.plugins.register("boom", PanickingFinish).unwrap();
        let p = pipeline_with("Ping.\n\n:plugin: boom\n", &registries, |_req: Request| async {
            Ok::<_, anyhow::Error>(Reply::success())
        });

        let payload = p.dispatch(Method::GET, RawParams::new()).await;
        assert_eq!(payload.code, "exception");
        assert_eq!(
            payload.json().unwrap(),
            json!({"code": "exception", "message": "Unknown exception"})
        );
    }

    #[tokio::test]
    async fn test_render_panic_falls_back_to_json() {
        let mut registries = Registries::default();
        registries.responses.register(PanickingResponse).unwrap();
        let p = pipeline_with("Ping.\n\n:response: broken\n", &registries, |_req: Request| async {
            Ok::<_, anyhow::Error>(Reply::success())
        });

        let payload = p.dispatch(Method::GET, RawParams::new()).await;
        assert_eq!(payload.content_type, "application/json");
        assert_eq!(
            payload.json().unwrap(),
            json!({"code": "exception", "message": "Unknown exception"})
        );
    }

    #[tokio::test]
    async fn test_rejection_skips_handler() {
        let p = pipeline("Ping.", |_req: Request| async {
            Ok::<_, anyhow::Error>(Reply::success())
        });
        let mut raw = RawParams::new();
        raw.insert("stray".into(), json!(1));

        let body = p.dispatch(Method::GET, raw).await.json().unwrap();
        assert_eq!(
            body,
            json!({"code": "param_unknown", "message": "Unknown parameter", "data": {"parameter": "stray"}})
        );
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
