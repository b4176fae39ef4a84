//! Application wiring: registries, routes and dispatch.
//!
//! An [`ApplicationBuilder`] collects registrations and routes; [`build`]
//! compiles every route's documentation into a contract, so a malformed doc
//! block stops startup instead of surfacing on the first request.
//!
//! [`build`]: ApplicationBuilder::build

use crate::error::{AppError, RouteError};
use crate::factory::PluginFactories;
use docket_config::DocketConfig;
use docket_core::{
    Endpoint, GenericType, ParamType, Payload, Plugin, RawParams, Registries, RegistryError,
    ResponseType, SharedPlugin,
};
use docket_element::{compile, Contract};
use docket_pipeline::Pipeline;
use http::Method;
use indexmap::IndexMap;
use std::sync::Arc;

struct PendingRoute {
    path: String,
    methods: Vec<Method>,
    endpoint: Endpoint,
}

/// Builder for an [`Application`].
///
/// Registration errors are kept and reported by [`build`](Self::build), so
/// calls chain without intermediate `?`.
///
/// # Example
///
/// ```
/// use docket::prelude::*;
///
/// let endpoint = Endpoint::from_fn("ping", "Ping.", |_req: Request| async {
///     Ok::<_, anyhow::Error>(Reply::success())
/// });
///
/// let app = Application::builder()
///     .route("/ping", &[Method::GET], endpoint)
///     .build()
///     .unwrap();
/// assert_eq!(app.len(), 1);
/// ```
pub struct ApplicationBuilder {
    registries: Registries,
    default_response: Option<String>,
    routes: Vec<PendingRoute>,
    error: Option<RegistryError>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Creates a builder with the built-in types and response types.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registries(Registries::default())
    }

    /// Creates a builder around existing registries.
    #[must_use]
    pub fn with_registries(registries: Registries) -> Self {
        Self {
            registries,
            default_response: None,
            routes: Vec::new(),
            error: None,
        }
    }

    fn record(&mut self, result: Result<(), RegistryError>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }

    /// Registers a parameter type.
    #[must_use]
    pub fn register_type(mut self, ty: impl ParamType) -> Self {
        let result = self.registries.types.register(ty);
        self.record(result);
        self
    }

    /// Registers a type constructor such as `List`.
    #[must_use]
    pub fn register_generic(mut self, ty: impl GenericType) -> Self {
        let result = self.registries.types.register_generic(ty);
        self.record(result);
        self
    }

    /// Registers a plugin under `key`.
    #[must_use]
    pub fn register_plugin(mut self, key: impl Into<String>, plugin: impl Plugin) -> Self {
        let result = self.registries.plugins.register(key, plugin);
        self.record(result);
        self
    }

    /// Registers an already shared plugin under `key`.
    #[must_use]
    pub fn register_shared_plugin(mut self, key: impl Into<String>, plugin: SharedPlugin) -> Self {
        let result = self.registries.plugins.register_shared(key, plugin);
        self.record(result);
        self
    }

    /// Registers a response type.
    #[must_use]
    pub fn register_response(mut self, response: impl ResponseType) -> Self {
        let result = self.registries.responses.register(response);
        self.record(result);
        self
    }

    /// Selects the response type used by contracts without a `:response:`
    /// directive. Resolved at build time, after every registration.
    #[must_use]
    pub fn default_response(mut self, name: impl Into<String>) -> Self {
        self.default_response = Some(name.into());
        self
    }

    /// Adds a route serving `endpoint` for each of `methods`.
    #[must_use]
    pub fn route(mut self, path: impl Into<String>, methods: &[Method], endpoint: Endpoint) -> Self {
        self.routes.push(PendingRoute {
            path: path.into(),
            methods: methods.to_vec(),
            endpoint,
        });
        self
    }

    /// Compiles every route and builds the application.
    ///
    /// # Errors
    ///
    /// Returns the first registration error, then the first route that has
    /// no methods, collides with an earlier route or fails to compile.
    pub fn build(mut self) -> Result<Application, AppError> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        if let Some(name) = &self.default_response {
            self.registries.responses.set_default(name)?;
        }

        let mut routes: Vec<Route> = Vec::with_capacity(self.routes.len());
        let mut table: IndexMap<String, IndexMap<Method, usize>> = IndexMap::new();

        for pending in self.routes {
            let PendingRoute {
                path,
                methods,
                endpoint,
            } = pending;

            if methods.is_empty() {
                return Err(AppError::NoMethods { path });
            }
            let slots = table.entry(path.clone()).or_default();
            if let Some(method) = methods.iter().find(|m| slots.contains_key(*m)) {
                return Err(AppError::DuplicateRoute {
                    path,
                    method: method.clone(),
                });
            }

            let contract = compile(endpoint.name(), endpoint.doc(), &methods, &self.registries)
                .map_err(|source| AppError::Compile {
                    path: path.clone(),
                    source,
                })?;

            let index = routes.len();
            for method in &methods {
                slots.insert(method.clone(), index);
            }
            tracing::debug!(
                path = %path,
                endpoint = contract.endpoint(),
                methods = ?contract.methods(),
                "compiled route"
            );
            routes.push(Route {
                path,
                pipeline: Pipeline::new(contract, endpoint.handler().clone()),
            });
        }

        docket_telemetry::metrics::record_compiled(routes.len());
        tracing::info!(routes = routes.len(), paths = table.len(), "application built");

        Ok(Application {
            registries: Arc::new(self.registries),
            routes,
            table,
        })
    }
}

struct Route {
    path: String,
    pipeline: Pipeline,
}

/// A set of compiled routes ready to dispatch.
///
/// The application knows nothing about HTTP transport: it takes a path,
/// a method and decoded parameters, and returns a rendered payload.
pub struct Application {
    registries: Arc<Registries>,
    routes: Vec<Route>,
    table: IndexMap<String, IndexMap<Method, usize>>,
}

impl Application {
    /// Starts a builder with the built-in registries.
    #[must_use]
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Starts a builder wired from configuration.
    ///
    /// Each configured plugin is built by the factory for its kind and
    /// registered under its key, in file order; the configured default
    /// response type is applied at build time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnknownPluginKind`] when no factory handles a
    /// kind, and [`AppError::PluginFactory`] when a factory fails.
    pub fn from_config(
        config: &DocketConfig,
        factories: &PluginFactories,
    ) -> Result<ApplicationBuilder, AppError> {
        let mut builder = ApplicationBuilder::new();
        for (key, plugin_config) in &config.plugins {
            let plugin = match factories.build(plugin_config) {
                Some(Ok(plugin)) => plugin,
                Some(Err(source)) => {
                    return Err(AppError::PluginFactory {
                        key: key.clone(),
                        source,
                    })
                }
                None => {
                    return Err(AppError::UnknownPluginKind {
                        key: key.clone(),
                        kind: plugin_config.kind.clone(),
                    })
                }
            };
            builder.registries.plugins.register_shared(key.clone(), plugin)?;
        }
        Ok(builder.default_response(config.responses.default.clone()))
    }

    /// Returns the registries the routes were compiled against.
    #[must_use]
    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the application has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every route with its contract, in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &Contract)> {
        self.routes
            .iter()
            .map(|route| (route.path.as_str(), route.pipeline.contract().as_ref()))
    }

    /// Methods accepted at `path`.
    #[must_use]
    pub fn allowed(&self, path: &str) -> Option<Vec<Method>> {
        self.table.get(path).map(|slots| slots.keys().cloned().collect())
    }

    /// Resolves a path and method to its pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for an unknown path or method.
    pub fn resolve(&self, path: &str, method: &Method) -> Result<&Pipeline, RouteError> {
        let slots = self.table.get(path).ok_or_else(|| RouteError::NotFound {
            path: path.to_string(),
        })?;
        let index = slots
            .get(method)
            .ok_or_else(|| RouteError::MethodNotAllowed {
                path: path.to_string(),
                method: method.clone(),
                allowed: slots.keys().cloned().collect(),
            })?;
        Ok(&self.routes[*index].pipeline)
    }

    /// Returns the contract serving `path` and `method`.
    #[must_use]
    pub fn contract(&self, path: &str, method: &Method) -> Option<&Contract> {
        self.resolve(path, method)
            .ok()
            .map(|pipeline| pipeline.contract().as_ref())
    }

    /// Dispatches a request.
    ///
    /// Once routed, a request always yields a payload: rejections, handler
    /// errors and panics are rendered as envelopes.
    ///
    /// ```
    /// use docket::prelude::*;
    ///
    /// # tokio_test::block_on(async {
    /// let doc = "Double a number.\n\n:param Int * n:\n";
    /// let endpoint = Endpoint::from_fn("double", doc, |req: Request| async move {
    ///     let n = req.params.int("n").unwrap_or_default();
    ///     Ok::<_, anyhow::Error>(Reply::success().data(json!(n * 2)))
    /// });
    /// let app = Application::builder()
    ///     .route("/double", &[Method::GET], endpoint)
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut raw = RawParams::new();
    /// raw.insert("n".into(), json!("21"));
    /// let payload = app.dispatch("/double", Method::GET, raw).await.unwrap();
    /// assert_eq!(payload.json().unwrap()["data"], json!(42));
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if no route matches.
    pub async fn dispatch(
        &self,
        path: &str,
        method: Method,
        raw: RawParams,
    ) -> Result<Payload, RouteError> {
        let pipeline = self.resolve(path, &method).map_err(|err| {
            tracing::debug!(path, method = %method, error = %err, "unrouted request");
            err
        })?;
        Ok(pipeline.dispatch(method, raw).await)
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("routes", &self.routes.iter().map(|r| r.path.as_str()).collect::<Vec<_>>())
            .field("default_response", &self.default_response)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("routes", &self.routes().map(|(path, c)| (path, c.endpoint())).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::fixtures::{self, JsonpPlugin, AREA_DOC};
    use docket_core::{Reply, Request};
    use serde_json::json;

    fn ping() -> Endpoint {
        Endpoint::from_fn("ping", "Ping.", |_req: Request| async {
            Ok::<_, anyhow::Error>(Reply::success())
        })
    }

    fn area() -> Endpoint {
        Endpoint::from_fn("area.get", AREA_DOC, |req: Request| async move {
            Ok::<_, anyhow::Error>(Reply::success().data(json!({ "id": req.params.int("area_id") })))
        })
    }

    #[test]
    fn test_registration_error_is_deferred() {
        let err = Application::builder()
            .register_plugin("json_p", JsonpPlugin::new())
            .register_plugin("json_p", JsonpPlugin::new())
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "plugin already registered: json_p");
    }

    #[test]
    fn test_builder_debug_lists_routes() {
        let builder = Application::builder()
            .default_response("plain")
            .route("/ping", &[Method::GET], ping());
        let debug = format!("{builder:?}");
        assert!(debug.starts_with("ApplicationBuilder"));
        assert!(debug.contains(r#"routes: ["/ping"]"#));
        assert!(debug.contains(r#"default_response: Some("plain")"#));
    }

    #[test]
    fn test_route_without_methods() {
        let err = Application::builder().route("/ping", &[], ping()).build().unwrap_err();
        assert!(matches!(err, AppError::NoMethods { path } if path == "/ping"));
    }

    #[test]
    fn test_same_path_different_methods() {
        let app = Application::builder()
            .route("/ping", &[Method::GET], ping())
            .route("/ping", &[Method::POST], ping().with_name("ping.post"))
            .build()
            .unwrap();
        assert_eq!(app.len(), 2);
        assert_eq!(app.allowed("/ping"), Some(vec![Method::GET, Method::POST]));
        assert_eq!(app.contract("/ping", &Method::POST).unwrap().endpoint(), "ping.post");
    }

    #[test]
    fn test_duplicate_route() {
        let err = Application::builder()
            .route("/ping", &[Method::GET, Method::HEAD], ping())
            .route("/ping", &[Method::HEAD], ping())
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateRoute { method, .. } if method == Method::HEAD));
    }

    #[test]
    fn test_unknown_plugin_fails_compile() {
        let err = Application::builder()
            .route("/area", &[Method::GET], area())
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::Compile { ref path, .. } if path == "/area"));
    }

    #[test]
    fn test_unknown_default_response() {
        let err = Application::builder().default_response("xml").build().unwrap_err();
        assert!(matches!(err, AppError::Registry(RegistryError::InvalidKey { .. })));
    }

    #[test]
    fn test_resolve_errors() {
        let app = Application::builder()
            .route("/ping", &[Method::GET], ping())
            .build()
            .unwrap();
        assert_eq!(
            app.resolve("/pong", &Method::GET).unwrap_err(),
            RouteError::NotFound { path: "/pong".into() }
        );
        assert_eq!(
            app.resolve("/ping", &Method::DELETE).unwrap_err(),
            RouteError::MethodNotAllowed {
                path: "/ping".into(),
                method: Method::DELETE,
                allowed: vec![Method::GET],
            }
        );
    }

    #[tokio::test]
    async fn test_dispatch_with_registered_plugins() {
        let app = ApplicationBuilder::with_registries(fixtures::registries().unwrap())
            .route("/area", &[Method::GET], area())
            .build()
            .unwrap();

        let mut raw = RawParams::new();
        raw.insert("area_id".into(), json!("12"));
        let payload = app.dispatch("/area", Method::GET, raw).await.unwrap();
        assert_eq!(
            payload.json().unwrap(),
            json!({"code": "success", "message": "Success", "data": {"id": 12}})
        );
    }
}
