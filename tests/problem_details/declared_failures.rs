//! tests/problem_details/declared_failures.rs
//! Non-500 failures are rewritten into enriched problem envelopes.

use crate::common;

use problem_details_api::config::environment::EnvironmentVariables;
use reqwest::{header, StatusCode};
use serde_json::Value;
use std::borrow::Cow;

#[tokio::test]
async fn partial_detail_is_completed() {
    let base_url: String = common::spawn_app(common::development());

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/not-found", base_url))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");

    let body: String = resp.text().await.unwrap();
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], 404);
    assert_eq!(json["title"], "Not Found");
    assert_eq!(json["detail"], "Booking not found");
    assert_eq!(json["type"], "about:blank");
    assert_eq!(json["instance"], "/not-found");
    assert_eq!(json["requestId"], "abc-123");
    assert!(json["traceId"].is_string());
    assert!(json["spanId"].is_string());
}

#[tokio::test]
async fn unknown_route_gets_placeholder_detail() {
    let base_url: String = common::spawn_app(common::development());

    let (status, headers, body) = common::get(format!("{}/no/such/route", base_url)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);

    // Content-Length always matches the rewritten body
    let length: usize = headers[header::CONTENT_LENGTH].to_str().unwrap().parse().unwrap();
    assert_eq!(length, body.len());

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["detail"], "Details weren't specified");
    assert_eq!(json["instance"], "/no/such/route");
    // Without the header a request id is generated
    assert!(!json["requestId"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn every_declared_status_is_rewritten() {
    let base_url: String = common::spawn_app(common::development());

    for code in [400u16, 401, 403, 418, 429, 501, 502, 503] {
        let (status, _, body) = common::get(format!("{}/declared/{}", base_url, code)).await;

        assert_eq!(status.as_u16(), code);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], code);
        assert_eq!(json["detail"], "Details weren't specified");
    }
}

#[tokio::test]
async fn plain_text_reason_becomes_detail() {
    let base_url: String = common::spawn_app(common::development());

    let (status, _, body) = common::get(format!("{}/conflict", base_url)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["title"], "Conflict");
    assert_eq!(json["detail"], "Booking was already confirmed");
}

#[tokio::test]
async fn handler_members_and_extensions_are_kept() {
    let base_url: String = common::spawn_app(common::development());

    let (status, _, body) = common::get(format!("{}/payment", base_url)).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["title"], "Insufficient balance");
    assert_eq!(json["type"], "https://example.com/probs/out-of-credit");
    assert_eq!(json["balance"], 30);
}

#[tokio::test]
async fn trace_context_headers_are_reported() {
    let base_url: String = common::spawn_app(common::development());

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/declared/404", base_url))
        .header("traceparent", "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
        .header("baggage", "tenant=acme;ttl=60,region=eu")
        .send()
        .await
        .expect("Request failed");

    let body: String = resp.text().await.unwrap();
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["traceId"], "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_eq!(json["parentId"], "00f067aa0ba902b7");
    assert_ne!(json["spanId"], "00f067aa0ba902b7");
    assert_eq!(json["tenant"], "acme");
    assert_eq!(json["region"], "eu");
}

#[tokio::test]
async fn rfc9110_preset_links_the_status() {
    let environment: EnvironmentVariables = EnvironmentVariables {
        problem_type_links: Cow::Borrowed("rfc9110"),
        ..common::development()
    };
    let base_url: String = common::spawn_app(environment);

    let (_, _, body) = common::get(format!("{}/declared/409", base_url)).await;

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["type"], "https://tools.ietf.org/html/rfc9110#section-15.5.10");
}

#[tokio::test]
async fn custom_correlation_header_is_read() {
    let environment: EnvironmentVariables = EnvironmentVariables {
        request_id_header: Cow::Borrowed("x-correlation-id"),
        ..common::development()
    };
    let base_url: String = common::spawn_app(environment);

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/declared/403", base_url))
        .header("x-correlation-id", "corr-7")
        .send()
        .await
        .expect("Request failed");

    let body: String = resp.text().await.unwrap();
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["requestId"], "corr-7");
}
