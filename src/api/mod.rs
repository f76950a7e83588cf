//! HTTP transport: application state, routing, and handlers.
//!
//! All handlers share one [`AppState`] behind an `Arc`. Routing keeps the
//! same URL shapes the web client already speaks, including the `username`
//! path parameter on read routes; handlers verify that the path identity
//! matches the token before doing any work.

use std::{sync::Arc, time::Duration};

use crate::{
    chat::GeminiClient,
    config::AppConfig,
    errors::Result,
    flags::FeatureFlagClient,
};
use axum::{
    Json, Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Registration and login handlers
pub mod auth;
/// The assistant endpoint and its context companion
pub mod chat;
/// The authenticated-user extractor
pub mod extract;
/// Fixed-window rate limiting
pub mod limit;
/// Transaction CRUD and summary handlers
pub mod transactions;

use limit::RateLimiter;

const AUTH_LIMIT: u32 = 5;
const AUTH_WINDOW: Duration = Duration::from_secs(15 * 60);
const CHAT_LIMIT: u32 = 20;
const CHAT_WINDOW: Duration = Duration::from_secs(60);

/// Everything the handlers need, shared across requests.
#[derive(Debug)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Absent when no model API key is configured; the chat endpoint
    /// reports the assistant as unconfigured in that case
    pub model: Option<GeminiClient>,
    pub flags: FeatureFlagClient,
    pub auth_limiter: RateLimiter,
    pub chat_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Result<Self> {
        let model = if config.model_api_key.is_some() {
            Some(GeminiClient::new(&config)?)
        } else {
            None
        };
        let flags = FeatureFlagClient::new(&config)?;
        Ok(Self {
            db,
            config,
            model,
            flags,
            auth_limiter: RateLimiter::new(AUTH_LIMIT, AUTH_WINDOW),
            chat_limiter: RateLimiter::new(CHAT_LIMIT, CHAT_WINDOW),
        })
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/transactions/add", post(transactions::create))
        .route("/transactions/id/{id}", get(transactions::get_one))
        .route(
            "/transactions/{username}",
            get(transactions::list)
                .put(transactions::update)
                .delete(transactions::remove),
        )
        .route("/transactions/{username}/summary", get(transactions::summary))
        .route("/chat/message", post(chat::chat))
        .route("/chat/context/{username}", get(chat::chat_context))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
