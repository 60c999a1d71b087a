// Start of file: src/main.rs

use axum::{Router, serve};
use tokio::net::TcpListener;
use tracing::info;

use problem_details_api::config::{environment::EnvironmentVariables, state::AppState};
use problem_details_api::core::{
    logging::init_tracing,
    server::{create_app, setup_listener, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let environment: EnvironmentVariables = EnvironmentVariables::load()?;
    let listener: TcpListener = setup_listener(&environment).await?;
    let state: AppState = AppState::new(environment)?;

    info!(
        production = state.environment.is_production(),
        correlation_header = %state.problems.correlation_header(),
        "Problem details enabled"
    );

    let app: Router = create_app(state);

    info!("Server listening on: {}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// End of file: src/main.rs
