//! tests/problem_details/faults.rs
//! Faults, panics and layer errors all end up as problem envelopes.

use crate::common;

use reqwest::{header, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn fault_is_rendered_with_stack_trace_outside_production() {
    let base_url: String = common::spawn_app(common::development());

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/fault", base_url))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");

    let body: String = resp.text().await.unwrap();
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], 500);
    assert_eq!(json["title"], "Internal Server Error");
    assert_eq!(json["detail"], "disk full");
    assert_eq!(json["instance"], "/fault");
    assert_eq!(json["x-request-id"], "abc-123");
    assert_eq!(json["requestId"], "abc-123");
    assert_eq!(json["volume"], "/var/lib/bookings");
    assert!(!json["StackTrace"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn production_hides_stack_trace() {
    let base_url: String = common::spawn_app(common::production());

    let (status, _, body) = common::get(format!("{}/fault", base_url)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["detail"], "disk full");
    assert!(json.get("StackTrace").is_none());
    // No correlation header was sent
    assert!(json.get("x-request-id").is_none());
}

#[tokio::test]
async fn panic_becomes_internal_server_error() {
    let base_url: String = common::spawn_app(common::development());

    let (status, headers, body) = common::get(format!("{}/panic", base_url)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let length: usize = headers[header::CONTENT_LENGTH].to_str().unwrap().parse().unwrap();
    assert_eq!(length, body.len());

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["detail"], "booking cache poisoned");
    assert!(json["StackTrace"].is_string());
}

#[tokio::test]
async fn malformed_failure_body_becomes_fault() {
    let base_url: String = common::spawn_app(common::development());

    let (status, _, body) = common::get(format!("{}/malformed", base_url)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], 500);
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("malformed problem body"));
}

#[tokio::test]
async fn returns_408_when_request_times_out() {
    let base_url: String = common::spawn_app(common::development());

    let resp_result: Result<Result<reqwest::Response, reqwest::Error>, tokio::time::error::Elapsed> = timeout(
        Duration::from_secs(5), // client-side timeout duration
        async {
            reqwest::Client::new()
                .get(format!("{}/timeout", base_url))
                .send()
                .await
        }
    )
    .await;

    // Ensure the client did not timeout waiting for a response.
    assert!(resp_result.is_ok(), "Client timed out waiting for server.");

    let resp: reqwest::Response = resp_result.unwrap().expect("Request failed unexpectedly.");
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    let body: String = resp.text().await.unwrap();
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], 408);
    assert_eq!(json["title"], "Request Timeout");
    assert!(json["detail"].as_str().unwrap().starts_with("Request timeout"));
}

#[tokio::test]
async fn returns_413_when_body_is_too_large() {
    let base_url: String = common::spawn_app(common::development());

    // Slightly larger than the 2MB default limit
    let oversized_payload: Vec<u8> = vec![b'X'; 2_097_152 + 100];

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/body-size", base_url))
        .body(oversized_payload)
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body: String = resp.text().await.unwrap();
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], 413);
    assert_eq!(json["instance"], "/body-size");
    assert!(!json["detail"].as_str().unwrap().is_empty());
}
