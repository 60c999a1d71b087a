// Application state shared by handlers and middleware

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::environment::EnvironmentVariables;
use crate::problem::{ProblemDetails, ProblemDetailsOptions};

#[derive(Debug, Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub problems: ProblemDetails,
}

impl AppState {
    /// Creates the state, validating the problem details settings
    pub fn new(environment: EnvironmentVariables) -> anyhow::Result<Self> {
        let options: ProblemDetailsOptions = ProblemDetailsOptions::from_env(&environment)?;

        Ok(Self {
            environment: Arc::new(environment),
            problems: ProblemDetails::new(options),
        })
    }

    /// Loads the environment and builds the state from it
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(EnvironmentVariables::load()?)
    }
}

// Lets problem details extractors run on routers holding the app state
impl FromRef<AppState> for ProblemDetails {
    fn from_ref(state: &AppState) -> Self {
        state.problems.clone()
    }
}
