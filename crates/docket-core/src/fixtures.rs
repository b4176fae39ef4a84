//! Test fixtures for Docket development and testing.
//!
//! Two small plugins and a handful of documentation blocks that exercise the
//! contract compiler and the pipeline end to end:
//!
//! - [`TokenPlugin`] - requires a `token` parameter and rejects bad tokens
//! - [`JsonpPlugin`] - wraps the rendered body in a JSON-P callback
//!
//! # Example
//!
//! ```
//! use docket_core::fixtures;
//!
//! let registries = fixtures::registries().unwrap();
//! assert!(registries.plugins.lookup("token").is_some());
//! assert!(registries.plugins.lookup("json_p").is_some());
//! ```

use crate::code::CodeSpec;
use crate::error::RegistryError;
use crate::invocation::Invocation;
use crate::plugin::{BoxFuture, Next, Plugin, PluginParam};
use crate::registry::Registries;
use crate::response::{Envelope, Payload};
use bytes::Bytes;
use std::sync::Mutex;

/// Documentation of a handler that reads an area by id.
pub const AREA_DOC: &str = "Get the area information through it's id.

:plugin: json_p
:param Int * area_id: area id
:raise id_not_exist: Record does not exist.
";

/// Documentation of a handler that reads a user, guarded by a token.
pub const USER_GET_DOC: &str = "Get the user information through his/hers id.

:plugin: json_p token
:param Str * identity:
:param Str * token:
:param Int * user_id:
:raise id_not_exist: Record does not exist.
";

/// Documentation of a handler that updates user settings.
pub const USER_POST_DOC: &str = "User setting

:plugin: token
:param Str * username:
:param Str nickname:
:param Str * password:
:param Mail * email:
:param Str address:
:param Str mobile:
:param Str zipcode:
:raise mobile_existent: Mobile number already exists.
:raise email_existent: Email address already exists.
";

/// Secret used by [`registries`].
pub const TEST_SECRET: &str = "test-secret";

/// The caller a [`TokenPlugin`] authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

/// Requires a `token` parameter of the form `<identity>.<secret>`.
///
/// Stores the [`Identity`] in the invocation extensions on success and
/// responds with `token_invalid` otherwise.
#[derive(Debug)]
pub struct TokenPlugin {
    secret: String,
    params: Vec<PluginParam>,
    codes: Vec<CodeSpec>,
    initialized: Mutex<Vec<String>>,
}

impl TokenPlugin {
    /// Code for a missing or wrong token.
    pub const INVALID: &'static str = "token_invalid";

    /// Creates a plugin accepting tokens signed with `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            params: vec![PluginParam::required("token", "Str").description("access token")],
            codes: vec![CodeSpec::new(Self::INVALID, "Invalid token")],
            initialized: Mutex::new(Vec::new()),
        }
    }

    /// Issues a token for `identity`.
    #[must_use]
    pub fn issue(&self, identity: &str) -> String {
        format!("{identity}.{}", self.secret)
    }

    /// Returns the identity a token was issued for.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Identity> {
        let (identity, secret) = token.rsplit_once('.')?;
        (secret == self.secret && !identity.is_empty()).then(|| Identity(identity.to_string()))
    }

    /// Endpoints this plugin was initialized for, in order.
    #[must_use]
    pub fn initialized(&self) -> Vec<String> {
        self.initialized
            .lock()
            .map(|endpoints| endpoints.clone())
            .unwrap_or_default()
    }
}

impl Plugin for TokenPlugin {
    fn name(&self) -> &str {
        "token"
    }

    fn parameters(&self) -> &[PluginParam] {
        &self.params
    }

    fn error_codes(&self) -> &[CodeSpec] {
        &self.codes
    }

    fn init_endpoint(&self, endpoint: &str) {
        if let Ok(mut endpoints) = self.initialized.lock() {
            endpoints.push(endpoint.to_string());
        }
    }

    fn process<'a>(&'a self, inv: &'a mut Invocation, next: Next<'a>) -> BoxFuture<'a, Envelope> {
        Box::pin(async move {
            let identity = inv
                .raw_value("token")
                .and_then(|v| v.as_str())
                .and_then(|token| self.verify(token));
            match identity {
                Some(identity) => {
                    inv.extensions_mut().insert(identity);
                    next.run(inv).await
                }
                None => {
                    tracing::warn!(endpoint = inv.endpoint(), "rejected request with invalid token");
                    Envelope::new(Self::INVALID).with_message("Invalid token")
                }
            }
        })
    }
}

/// Wraps JSON bodies in `callback(...)` when a `callback` parameter is given.
#[derive(Debug)]
pub struct JsonpPlugin {
    params: Vec<PluginParam>,
}

impl JsonpPlugin {
    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: vec![PluginParam::optional("callback", "Str").description("JSON-P callback name")],
        }
    }

    fn valid_callback(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
    }
}

impl Default for JsonpPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for JsonpPlugin {
    fn name(&self) -> &str {
        "json_p"
    }

    fn parameters(&self) -> &[PluginParam] {
        &self.params
    }

    fn finish(&self, inv: &Invocation, payload: &mut Payload) {
        let Some(callback) = inv.raw_value("callback").and_then(|v| v.as_str()) else {
            return;
        };
        if !Self::valid_callback(callback) {
            return;
        }
        let mut body = Vec::with_capacity(payload.body.len() + callback.len() + 2);
        body.extend_from_slice(callback.as_bytes());
        body.push(b'(');
        body.extend_from_slice(&payload.body);
        body.push(b')');
        payload.body = Bytes::from(body);
        payload.content_type = "application/javascript".to_string();
    }
}

/// Default registries plus `token` and `json_p` plugins.
pub fn registries() -> Result<Registries, RegistryError> {
    let mut registries = Registries::default();
    registries.plugins.register("token", TokenPlugin::new(TEST_SECRET))?;
    registries.plugins.register("json_p", JsonpPlugin::new())?;
    Ok(registries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::RawParams;
    use crate::response::{JsonResponse, ResponseType};
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_token_issue_and_verify() {
        let plugin = TokenPlugin::new("s3cret");
        let token = plugin.issue("alice");
        assert_eq!(plugin.verify(&token), Some(Identity("alice".into())));
        assert_eq!(plugin.verify("alice.wrong"), None);
        assert_eq!(plugin.verify(".s3cret"), None);
        assert_eq!(plugin.verify("garbage"), None);
    }

    #[tokio::test]
    async fn test_token_plugin_rejects_missing_token() {
        let plugin = TokenPlugin::new("s3cret");
        let mut inv = Invocation::new("user.get", Method::GET, RawParams::new());
        let next = Next::terminal(|_inv| -> BoxFuture<'static, Envelope> {
            panic!("terminal must not run")
        });

        let envelope = plugin.process(&mut inv, next).await;
        assert_eq!(envelope.code, TokenPlugin::INVALID);
    }

    #[tokio::test]
    async fn test_token_plugin_stores_identity() {
        let plugin = TokenPlugin::new("s3cret");
        let mut raw = RawParams::new();
        raw.insert("token".into(), json!(plugin.issue("bob")));
        let mut inv = Invocation::new("user.get", Method::GET, raw);

        let next = Next::terminal(|inv| {
            let seen = inv.extensions().get::<Identity>().cloned();
            Box::pin(async move {
                assert_eq!(seen, Some(Identity("bob".into())));
                Envelope::new("success")
            })
        });

        assert_eq!(plugin.process(&mut inv, next).await.code, "success");
    }

    #[test]
    fn test_jsonp_wraps_body() {
        let mut raw = RawParams::new();
        raw.insert("callback".into(), json!("cb"));
        let inv = Invocation::new("area.get", Method::GET, raw);

        let mut payload = JsonResponse.render(&Envelope::new("success"));
        JsonpPlugin::new().finish(&inv, &mut payload);

        assert_eq!(payload.text(), Some(r#"cb({"code":"success"})"#));
        assert_eq!(payload.content_type, "application/javascript");
    }

    #[test]
    fn test_jsonp_ignores_unsafe_callback() {
        let mut raw = RawParams::new();
        raw.insert("callback".into(), json!("alert(1)//"));
        let inv = Invocation::new("area.get", Method::GET, raw);

        let mut payload = JsonResponse.render(&Envelope::new("success"));
        JsonpPlugin::new().finish(&inv, &mut payload);
        assert_eq!(payload.content_type, "application/json");
    }

    #[test]
    fn test_init_endpoint_recorded() {
        let plugin = TokenPlugin::new("x");
        plugin.init_endpoint("a");
        plugin.init_endpoint("b");
        assert_eq!(plugin.initialized(), vec!["a", "b"]);
    }
}
