//! Exporting a built application's contracts.

use docket::docs::{OpenApiGenerator, ReferencePage};
use docket::prelude::*;
use docket_core::fixtures::{self, USER_GET_DOC, USER_POST_DOC};

async fn noop(_req: Request) -> HandlerResult {
    Ok(Reply::success())
}

fn app() -> Application {
    docket::ApplicationBuilder::with_registries(fixtures::registries().unwrap())
        .route("/user", &[Method::GET], Endpoint::from_fn("user.get", USER_GET_DOC, noop))
        .route("/user", &[Method::POST], Endpoint::from_fn("user.post", USER_POST_DOC, noop))
        .build()
        .unwrap()
}

#[test]
fn every_route_becomes_an_operation() {
    let app = app();
    let spec = OpenApiGenerator::new()
        .title("Users")
        .version("1.0.0")
        .generate(app.routes())
        .unwrap();

    assert_eq!(spec.paths.len(), 1);
    assert!(spec.operation("/user", &Method::GET).is_some());
    let post = spec.operation("/user", &Method::POST).unwrap();
    assert!(post.request_body.is_some());
    assert_eq!(post.extensions["x-plugins"], json!(["token"]));
}

#[test]
fn reference_page_lists_routes() {
    let app = app();
    let html = ReferencePage::new("Users").routes(app.routes()).html();
    assert!(html.contains("/user"));
    assert!(html.contains("Email address already exists."));
}
