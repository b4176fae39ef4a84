//! End-to-end dispatch through plugins, validation and handler.
//!
//! Uses the `user.get` fixture, which runs two plugins in order:
//!
//! 1. `json_p` - wraps the body when a `callback` is given
//! 2. `token` - rejects requests without a valid token
//!
//! followed by parameter validation and the handler.

use docket_core::fixtures::{self, Identity, TokenPlugin, TEST_SECRET, USER_GET_DOC};
use docket_core::{Endpoint, HandlerResult, Invocation, RawParams, Reply, Request};
use docket_element::compile;
use docket_pipeline::Pipeline;
use http::{Method, StatusCode};
use serde_json::{json, Value};

async fn user_get(req: Request) -> HandlerResult {
    let user_id = req.params.int("user_id").unwrap_or_default();
    if user_id == 0 {
        return Ok(Reply::new("id_not_exist"));
    }
    let caller = req.extensions.get::<Identity>().map(|id| id.0.clone());
    Ok(Reply::success().data(json!({ "user_id": user_id, "caller": caller })))
}

fn pipeline() -> Pipeline {
    let registries = fixtures::registries().unwrap();
    let contract = compile("user.get", Some(USER_GET_DOC), &[Method::GET], &registries).unwrap();
    let endpoint = Endpoint::from_fn("user.get", USER_GET_DOC, user_get);
    Pipeline::new(contract, endpoint.handler().clone())
}

fn token() -> String {
    TokenPlugin::new(TEST_SECRET).issue("alice")
}

fn raw(pairs: &[(&str, Value)]) -> RawParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn plugins_run_before_validation() {
    let payload = pipeline().dispatch(Method::GET, RawParams::new()).await;
    assert_eq!(payload.status, StatusCode::OK);
    assert_eq!(
        payload.json().unwrap(),
        json!({"code": "token_invalid", "message": "Invalid token"})
    );
}

#[tokio::test]
async fn missing_required_parameter() {
    let payload = pipeline()
        .dispatch(Method::GET, raw(&[("token", json!(token())), ("user_id", json!(1))]))
        .await;
    assert_eq!(
        payload.json().unwrap(),
        json!({"code": "param_missing", "message": "Missing parameter", "data": {"parameter": "identity"}})
    );
}

#[tokio::test]
async fn handler_sees_coerced_params_and_plugin_state() {
    let payload = pipeline()
        .dispatch(
            Method::GET,
            raw(&[
                ("token", json!(token())),
                ("identity", json!("alice")),
                ("user_id", json!("42")),
            ]),
        )
        .await;
    assert_eq!(payload.content_type, "application/json");
    assert_eq!(
        payload.json().unwrap(),
        json!({"code": "success", "message": "Success", "data": {"user_id": 42, "caller": "alice"}})
    );
}

#[tokio::test]
async fn business_code_from_handler() {
    let payload = pipeline()
        .dispatch(
            Method::GET,
            raw(&[
                ("token", json!(token())),
                ("identity", json!("alice")),
                ("user_id", json!(0)),
            ]),
        )
        .await;
    assert_eq!(payload.code, "id_not_exist");
    assert_eq!(payload.json().unwrap()["message"], json!("Record does not exist."));
}

#[tokio::test]
async fn type_mismatch_and_unknown_parameter() {
    let pipeline = pipeline();
    let base = [("token", json!(token())), ("identity", json!("alice"))];

    let mut bad = base.to_vec();
    bad.push(("user_id", json!("abc")));
    let payload = pipeline.dispatch(Method::GET, raw(&bad)).await;
    assert_eq!(payload.code, "int_invalid");
    assert_eq!(payload.json().unwrap()["data"]["parameter"], json!("user_id"));

    let mut extra = base.to_vec();
    extra.push(("user_id", json!(1)));
    extra.push(("debug", json!(true)));
    let payload = pipeline.dispatch(Method::GET, raw(&extra)).await;
    assert_eq!(payload.code, "param_unknown");
}

#[tokio::test]
async fn jsonp_wraps_every_rendered_body() {
    let pipeline = pipeline();

    let payload = pipeline
        .dispatch(
            Method::GET,
            raw(&[
                ("token", json!(token())),
                ("identity", json!("alice")),
                ("user_id", json!(7)),
                ("callback", json!("cb")),
            ]),
        )
        .await;
    assert_eq!(payload.content_type, "application/javascript");
    let text = payload.text().unwrap();
    assert!(text.starts_with("cb({\"code\":\"success\""), "{text}");
    assert!(text.ends_with("})"));

    let rejected = pipeline
        .dispatch(Method::GET, raw(&[("callback", json!("cb"))]))
        .await;
    assert_eq!(rejected.text(), Some(r#"cb({"code":"token_invalid","message":"Invalid token"})"#));
}

#[tokio::test]
async fn invocation_keeps_validated_params() {
    let pipeline = pipeline();
    let mut inv = Invocation::new(
        "user.get",
        Method::GET,
        raw(&[
            ("token", json!(token())),
            ("identity", json!("alice")),
            ("user_id", json!("3")),
        ]),
    );
    let envelope = pipeline.execute(&mut inv).await;

    assert!(envelope.is_success());
    assert_eq!(inv.params().int("user_id"), Some(3));
    assert_eq!(inv.params().get("callback"), Some(&Value::Null));
    assert_eq!(inv.extensions().get::<Identity>(), Some(&Identity("alice".into())));
}
