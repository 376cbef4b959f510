//! End-to-end request flow tests against a local mock server.
//!
//! These tests verify complete workflows: configuration on disk seeds a
//! session, request states compose URLs, tables, and bodies, the executor
//! performs the exchange, and validators check what came back.

use httpmock::prelude::*;
use rest_harness::config::ResolverSettings;
use rest_harness::document::FieldValue;
use rest_harness::executor::RequestError;
use rest_harness::models::{HttpMethod, RetrySettings};
use rest_harness::session::{MergeMode, TestSession};
use rest_harness::validator::{self, CompareOp};
use serde_json::json;
use serial_test::serial;
use std::collections::HashMap;
use std::fs;
use std::sync::Once;
use std::time::{Duration, Instant};
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initialize test environment (run once)
fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Writes a config directory pointing `userApi` at the mock server.
fn session_for(server: &MockServer) -> (TempDir, TestSession) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("apis.yaml"),
        format!(
            r#"
userApi:
  default:
    baseUri: {base}
    basePath: /v1
    timeoutMs: 5000
    headers:
      Accept: application/json
      X-Api-Key: ${{api_key}}
"#,
            base = server.base_url()
        ),
    )
    .expect("Failed to write config");
    fs::write(dir.path().join("app.env"), "env=default\napi_key=test-key-9\n")
        .expect("Failed to write env file");

    let session = TestSession::new(
        ResolverSettings::new(dir.path()).with_env_file(dir.path().join("app.env")),
    );
    (dir, session)
}

fn table(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_get_flow_with_configured_headers() {
    init_test_env();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/users/42")
            .header("Accept", "application/json")
            .header("X-Api-Key", "test-key-9");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(r#"{"id": 42, "name": "Ada", "tags": ["admin", "beta"]}"#);
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_endpoint("/users/{userId}");
    request.merge_path_params(table(&[("userId", "42")]), MergeMode::Update);

    let response = session.execute(&mut request).expect("request should succeed");

    mock.assert();
    validator::assert_status(&response, 200).unwrap();
    validator::assert_response_field(&response, "name", CompareOp::Equal, &json!("Ada")).unwrap();
    validator::assert_response_field(&response, "tags", CompareOp::HasItem, &json!("admin"))
        .unwrap();
    validator::assert_response_field(&response, "tags", CompareOp::NotHasItem, &json!("gamma"))
        .unwrap();

    // The state keeps the response under its correlation id
    let recorded = request.last_response().expect("response should be recorded");
    assert_eq!(recorded.request_id, request.correlation_id());
}

#[test]
fn test_post_body_composed_by_path_updates() {
    init_test_env();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/users")
            .json_body(json!({"user": {"name": "Grace", "roles": ["dev"]}}));
        then.status(201)
            .header("Content-Type", "application/json")
            .body(r#"{"id": 7}"#);
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_method(HttpMethod::POST);
    request.set_endpoint("/users");
    request.set_body(r#"{"user": {}}"#);
    request
        .mutate_body("user.name", &FieldValue::Text("Grace".to_string()))
        .unwrap();
    request
        .mutate_body("user.roles[+]", &FieldValue::Text("dev".to_string()))
        .unwrap();

    let response = session.execute(&mut request).expect("request should succeed");

    mock.assert();
    validator::assert_status(&response, 201).unwrap();
    assert_eq!(response.read_path("id").unwrap(), "7");
}

#[test]
fn test_query_cookies_and_form() {
    init_test_env();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/search")
            .query_param("page", "2")
            .query_param("size", "10")
            .header("Cookie", "session=abc; theme=dark")
            .body("mode=fast");
        then.status(200).body("{}");
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_method(HttpMethod::POST);
    request.set_endpoint("/search");
    request.merge_query_params(table(&[("page", "2"), ("size", "10")]), MergeMode::Update);
    request.merge_cookies(table(&[("session", "abc"), ("theme", "dark")]), MergeMode::Update);
    request.merge_form_params(table(&[("mode", "fast")]), MergeMode::Update);

    let response = session.execute(&mut request).expect("request should succeed");

    mock.assert();
    assert!(response.is_success());
}

#[test]
fn test_non_success_status_is_returned_not_retried() {
    init_test_env();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v1/flaky");
        then.status(503).body(r#"{"error": "unavailable"}"#);
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_endpoint("/flaky");
    request.request_mut().retry = Some(RetrySettings {
        enabled: true,
        max_count: 3,
        max_backoff_ms: 50,
    });

    let response = session.execute(&mut request).expect("a 503 is still a response");

    // One call only: HTTP errors are final
    assert_eq!(mock.hits(), 1);
    assert_eq!(response.status_code, 503);
    assert!(response.is_server_error());
    assert_eq!(response.read_path("error").unwrap(), "unavailable");
}

#[test]
fn test_redirect_loop_is_a_protocol_error() {
    init_test_env();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/loop");
        then.status(302).header("Location", server.url("/v1/loop"));
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_endpoint("/loop");

    let result = session.execute(&mut request);
    assert!(matches!(result, Err(RequestError::ProtocolError(_))));
}

#[test]
fn test_xml_response_read_by_path() {
    init_test_env();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/order");
        then.status(200)
            .header("Content-Type", "application/xml")
            .body("<order><id>55</id><lines><sku>A-1</sku></lines><lines><sku>B-2</sku></lines></order>");
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_endpoint("/order");

    let response = session.execute(&mut request).unwrap();

    assert_eq!(response.read_path("id").unwrap(), "55");
    assert_eq!(response.read_path("lines[1].sku").unwrap(), "B-2");
    validator::assert_response_field(&response, "id", CompareOp::Equal, &json!(55)).unwrap();
}

#[test]
fn test_body_diff_reports_all_divergences() {
    init_test_env();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/report");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(r#"{"total": 3, "items": [1, 2]}"#);
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_endpoint("/report");
    let response = session.execute(&mut request).unwrap();

    let err = validator::assert_body_matches(&response, r#"{"total": 4, "items": [1, 2, 3]}"#)
        .unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("total: Expected 4 but got 3"));
    assert!(rendered.contains("items[]: Expected 3 values but got 2"));
}

#[test]
#[serial]
fn test_transport_failure_retries_then_surfaces() {
    init_test_env();
    // Nothing listens here; every attempt is a connect failure
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("apis.yaml"),
        "deadApi:\n  default:\n    baseUri: http://127.0.0.1:9\n    timeoutMs: 500\n",
    )
    .unwrap();
    let session = TestSession::new(ResolverSettings::new(dir.path()));

    let mut request = session.new_request("deadApi");
    request.set_endpoint("/ping");
    request.request_mut().retry = Some(RetrySettings {
        enabled: true,
        max_count: 2,
        max_backoff_ms: 200,
    });

    let start = Instant::now();
    let result = session.execute(&mut request);
    let elapsed = start.elapsed();

    assert!(matches!(
        result,
        Err(RequestError::NetworkError(_)) | Err(RequestError::Timeout)
    ));
    // Two backoffs happened: at least ~90ms + ~180ms after jitter
    assert!(
        elapsed >= Duration::from_millis(250),
        "retries finished too quickly: {:?}",
        elapsed
    );
}

#[test]
#[serial]
fn test_timeout_maps_to_timeout_error() {
    init_test_env();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/slow");
        then.status(200).delay(Duration::from_millis(800)).body("{}");
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_endpoint("/slow");
    request.set_timeout_ms(100);

    let result = session.execute(&mut request);
    assert!(matches!(result, Err(RequestError::Timeout)));
}

#[test]
fn test_state_reset_between_scenarios() {
    init_test_env();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/a");
        then.status(200).body("{}");
    });

    let (_dir, session) = session_for(&server);
    let mut request = session.new_request("userApi");
    request.set_endpoint("/a");
    session.execute(&mut request).unwrap();

    let old_id = request.correlation_id().to_string();
    request.reset();

    assert_ne!(request.correlation_id(), old_id);
    assert!(request.last_response().is_none());
    assert_eq!(request.request().base_uri, None);
}
