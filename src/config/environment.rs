// Start of file: /src/config/environment.rs

// * Environment configuration for the server and the problem details layers.

use std::{borrow::Cow, collections::HashMap};
// * anyhow for convenient error handling
use anyhow::{Context, Result};
use tracing::warn;

use crate::problem::context::DEFAULT_REQUEST_ID_HEADER;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 3; // 3 seconds
const DEFAULT_PROBLEM_TYPE_LINKS: &str = "none";

const PRODUCTION: &str = "production";

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    // * Header carrying the caller's correlation id
    pub request_id_header: Cow<'static, str>,
    // * Status -> type link preset: "none" or "rfc9110"
    pub problem_type_links: Cow<'static, str>,
}

impl Default for EnvironmentVariables {
    fn default() -> Self {
        Self {
            environment: Cow::Borrowed(DEFAULT_ENVIRONMENT),
            host: Cow::Borrowed(DEFAULT_HOST),
            port: DEFAULT_PORT,
            max_request_body_size: DEFAULT_MAX_BODY_SIZE,
            default_timeout_seconds: DEFAULT_TIMEOUT,
            request_id_header: Cow::Borrowed(DEFAULT_REQUEST_ID_HEADER),
            problem_type_links: Cow::Borrowed(DEFAULT_PROBLEM_TYPE_LINKS),
        }
    }
}

impl EnvironmentVariables {
    // * Loads environment variables.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != PRODUCTION {
            dotenv::dotenv().ok();
        }

        // * Collect all environment vars from the system and .env
        let vars: HashMap<String, String> = std::env::vars().collect();

        Self::from_vars(&vars)
    }

    // * Builds the configuration from a key/value source, providing defaults if missing
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get_var = |key: &str| vars.get(key).map(String::as_str);
        let defaults: Self = Self::default();

        Ok(Self {
            environment: get_var("ENVIRONMENT")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing ENVIRONMENT, defaulting to '{DEFAULT_ENVIRONMENT}'");
                    defaults.environment
                }),

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(defaults.host),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(defaults.port),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(defaults.max_request_body_size),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(defaults.default_timeout_seconds),

            request_id_header: get_var("REQUEST_ID_HEADER")
                .map(|s| Cow::Owned(s.trim().to_ascii_lowercase()))
                .unwrap_or(defaults.request_id_header),

            problem_type_links: get_var("PROBLEM_TYPE_LINKS")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(defaults.problem_type_links),
        })
    }

    // * Stack traces never leave a production deployment
    pub fn is_production(&self) -> bool {
        cfg!(feature = "production") || self.environment.eq_ignore_ascii_case(PRODUCTION)
    }
}


// End of file: /src/config/environment.rs
