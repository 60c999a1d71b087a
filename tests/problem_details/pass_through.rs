//! tests/problem_details/pass_through.rs
//! Successes and handler-rendered 500s leave the service untouched.

use crate::common;

use reqwest::{header, StatusCode};
use serde_json::Value;

#[tokio::test]
async fn success_is_not_rewritten() {
    let base_url: String = common::spawn_app(common::development());

    let (status, headers, body) = common::get(format!("{}/hello", base_url)).await;

    assert_eq!(status, StatusCode::OK);
    let length: usize = headers[header::CONTENT_LENGTH].to_str().unwrap().parse().unwrap();
    assert_eq!(length, body.len());

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["version"], "1.0.0");
    assert!(json.get("traceId").is_none());
}

#[tokio::test]
async fn handler_rendered_500_is_passed_through() {
    let base_url: String = common::spawn_app(common::development());

    let (status, _, body) = common::get(format!("{}/error", base_url)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error_type"], "deliberate_test_error");
    assert!(json.get("title").is_none());
}

#[tokio::test]
async fn body_within_limit_is_accepted() {
    let base_url: String = common::spawn_app(common::development());

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/body-size", base_url))
        .body("a".repeat(1024))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: String = resp.text().await.unwrap();
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["received_body_size"], 1024);
}
