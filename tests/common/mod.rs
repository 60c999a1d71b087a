//! tests/common/mod.rs
//! A shared test helper to spawn the app on an ephemeral port.

#![allow(dead_code)]

use std::borrow::Cow;

use axum::{serve, Router};
use problem_details_api::config::{environment::EnvironmentVariables, state::AppState};
use problem_details_api::core::server::create_app;
use tokio::net::TcpListener as TokioTcpListener;

/// Development settings with a short timeout so timeout tests stay fast.
pub fn development() -> EnvironmentVariables {
    EnvironmentVariables {
        default_timeout_seconds: 1,
        ..EnvironmentVariables::default()
    }
}

/// Production settings: stack traces are hidden.
pub fn production() -> EnvironmentVariables {
    EnvironmentVariables {
        environment: Cow::Borrowed("production"),
        ..development()
    }
}

/// Spawns the app on a random unused port and returns its base URL.
pub fn spawn_app(environment: EnvironmentVariables) -> String {
    let state: AppState = AppState::new(environment).expect("Invalid test configuration");

    // * Build the application exactly as main() does.
    let app: Router = create_app(state);

    // * Bind an ephemeral port using std::net::TcpListener.
    let std_listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    // * Convert std::net::TcpListener to tokio::net::TcpListener.
    let tokio_listener: TokioTcpListener = TokioTcpListener::from_std(std_listener)
        .expect("Failed to convert to tokio listener");

    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    // * Spawn the server in a background task.
    tokio::spawn(async move {
        serve(tokio_listener, app)
            .await
            .expect("Server failed");
    });

    // * Return the base URL, e.g. "http://127.0.0.1:12345".
    format!("http://{}", addr)
}

/// Sends a GET and returns the status, headers and raw body.
pub async fn get(url: String) -> (reqwest::StatusCode, reqwest::header::HeaderMap, String) {
    let resp: reqwest::Response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .expect("Request failed");

    let status = resp.status();
    let headers = resp.headers().clone();
    let body: String = resp.text().await.unwrap();
    (status, headers, body)
}
