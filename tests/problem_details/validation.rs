//! tests/problem_details/validation.rs
//! Validation problems built by handlers survive the interceptor intact.

use crate::common;

use reqwest::{header, StatusCode};
use serde_json::Value;

async fn post_booking(base_url: &str, payload: &str) -> (StatusCode, Value) {
    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/bookings", base_url))
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-request-id", "val-1")
        .body(payload.to_owned())
        .send()
        .await
        .expect("Request failed");

    let status: StatusCode = resp.status();
    let body: String = resp.text().await.unwrap();
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn every_invalid_field_is_reported() {
    let base_url: String = common::spawn_app(common::development());

    let (status, json) = post_booking(&base_url, r#"{"name": " ", "email": "nope"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert_eq!(json["title"], "One or more validation errors occurred.");
    assert_eq!(json["instance"], "/bookings");
    assert_eq!(json["requestId"], "val-1");
    assert_eq!(json["errors"]["name"][0], "The name field is required.");
    assert_eq!(json["errors"]["email"][0], "The email field is not a valid e-mail address.");
}

#[tokio::test]
async fn valid_booking_passes_through() {
    let base_url: String = common::spawn_app(common::development());

    let (status, json) = post_booking(&base_url, r#"{"name": "Ada", "email": "ada@example.com"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["accepted"], true);
}

#[tokio::test]
async fn unparsable_request_body_is_a_declared_failure() {
    let base_url: String = common::spawn_app(common::development());

    let (status, json) = post_booking(&base_url, "{").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(!json["detail"].as_str().unwrap().is_empty());
    assert!(json.get("errors").is_none());
}
