//! Application settings loaded from environment variables.
//!
//! Everything the process needs is assembled into one [`AppConfig`] at startup
//! (after `dotenvy` has had a chance to populate the environment) and shared
//! behind an `Arc`. Only `JWT_SECRET` is mandatory; all other settings have
//! development-friendly defaults.

use crate::errors::{Error, Result};

/// Default chat model when `MODEL_NAME` is not set.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Runtime configuration for the whole application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds to (`PORT`, default 5000)
    pub port: u16,
    /// Database connection string (`DATABASE_URL`)
    pub database_url: String,
    /// Secret used to sign and verify session tokens (`JWT_SECRET`, required)
    pub jwt_secret: String,
    /// API key for the model service (`GEMINI_API_KEY`; chat fails without it)
    pub model_api_key: Option<String>,
    /// Base URL of the model service (`MODEL_BASE_URL`)
    pub model_base_url: String,
    /// Model name to request (`MODEL_NAME`)
    pub model_name: String,
    /// Base URL of the feature-flag evaluator (`FEATURE_FLAG_SERVICE_URL`)
    pub flag_service_url: String,
    /// Shared secret for the flag evaluator (`FEATURE_FLAG_SECRET`);
    /// absent means every flag evaluates to disabled
    pub flag_service_secret: Option<String>,
}

impl AppConfig {
    /// Loads the configuration from the environment.
    pub fn load() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| Error::Config {
            message: "JWT_SECRET must be set".to_string(),
        })?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| Error::Config {
                message: format!("PORT is not a valid port number: {raw}"),
            })?,
            Err(_) => 5000,
        };

        Ok(Self {
            port,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/expense_buddy.sqlite?mode=rwc".to_string()),
            jwt_secret,
            model_api_key: std::env::var("GEMINI_API_KEY").ok(),
            model_base_url: std::env::var("MODEL_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            model_name: std::env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            flag_service_url: std::env::var("FEATURE_FLAG_SERVICE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5001".to_string()),
            flag_service_secret: std::env::var("FEATURE_FLAG_SECRET").ok(),
        })
    }
}
