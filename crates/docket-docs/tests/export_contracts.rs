//! OpenAPI export of the user fixtures.

use docket_core::fixtures::{self, USER_GET_DOC, USER_POST_DOC};
use docket_docs::{OpenApiGenerator, ParameterIn, SchemaType};
use docket_element::{compile, Contract};
use http::Method;
use serde_json::{json, Value};

fn contracts() -> (Contract, Contract) {
    let registries = fixtures::registries().unwrap();
    let get = compile("user.get", Some(USER_GET_DOC), &[Method::GET], &registries).unwrap();
    let post = compile("user.post", Some(USER_POST_DOC), &[Method::POST], &registries).unwrap();
    (get, post)
}

#[test]
fn get_operation_lists_query_parameters_with_origin() {
    let (get, post) = contracts();
    let spec = OpenApiGenerator::new()
        .title("Users")
        .version("1.0.0")
        .generate([("/user", &get), ("/user", &post)])
        .unwrap();

    assert_eq!(spec.openapi, "3.1.0");
    assert_eq!(spec.tags.len(), 1);
    assert_eq!(spec.tags[0].name, "user");

    let op = spec.operation("/user", &Method::GET).unwrap();
    let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["token", "callback", "identity", "user_id"]);
    assert!(op.parameters.iter().all(|p| p.location == ParameterIn::Query));

    let token = &op.parameters[0];
    assert!(token.required);
    assert_eq!(token.extensions["x-origin"], json!("plugin:token"));
    let callback = &op.parameters[1];
    assert!(!callback.required);
    assert_eq!(callback.extensions["x-origin"], json!("plugin:json_p"));
    assert_eq!(op.parameters[3].schema.schema_type, Some(SchemaType::Integer));

    assert_eq!(op.extensions["x-plugins"], json!(["json_p", "token"]));
}

#[test]
fn codes_are_exported_in_index_order() {
    let (get, _) = contracts();
    let spec = OpenApiGenerator::new().generate([("/user", &get)]).unwrap();
    let op = spec.operation("/user", &Method::GET).unwrap();

    let codes: Vec<&str> = op.extensions["x-codes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["code"].as_str())
        .collect();
    assert_eq!(codes, get.code_index());

    let response = &op.responses["200"];
    let schema = &response.content["application/json"].schema;
    assert_eq!(schema.properties["code"].enum_values.len(), codes.len());
}

#[test]
fn post_operation_uses_request_body() {
    let (_, post) = contracts();
    let spec = OpenApiGenerator::new().generate([("/user", &post)]).unwrap();
    let op = spec.operation("/user", &Method::POST).unwrap();

    assert!(op.parameters.is_empty());
    let body = op.request_body.as_ref().unwrap();
    let schema = &body.content["application/x-www-form-urlencoded"].schema;
    assert_eq!(schema.properties["email"].format.as_deref(), Some("email"));
    assert!(schema.required.contains(&"token".to_string()));
    assert!(!schema.required.contains(&"nickname".to_string()));
}

#[test]
fn document_serializes_to_openapi_json() {
    let (get, _) = contracts();
    let spec = OpenApiGenerator::new().generate([("/user", &get)]).unwrap();
    let value: Value = serde_json::from_str(&spec.to_json().unwrap()).unwrap();

    assert_eq!(value["info"]["title"], json!("Docket API"));
    let op = &value["paths"]["/user"]["get"];
    assert_eq!(op["operationId"], json!("user.get"));
    assert_eq!(op["parameters"][0]["in"], json!("query"));
    assert_eq!(op["x-response"], json!("json"));
    assert!(value["paths"]["/user"].get("post").is_none());
}
