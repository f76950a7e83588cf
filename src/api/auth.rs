//! Registration and login endpoints.
//!
//! Both endpoints share the auth rate limit (five attempts per IP per
//! fifteen minutes) so neither account creation nor password guessing can be
//! brute forced.

use std::{net::SocketAddr, sync::Arc};

use crate::{api::AppState, auth, errors::Result};
use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    state.auth_limiter.check(addr.ip())?;

    let (user, token) = auth::register(
        &state.db,
        &state.config.jwt_secret,
        &body.username,
        &body.email,
        &body.password,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": user, "token": token })),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    state.auth_limiter.check(addr.ip())?;

    let (user, token) = auth::login(
        &state.db,
        &state.config.jwt_secret,
        &body.username,
        &body.password,
    )
    .await?;

    Ok(Json(json!({ "success": true, "user": user, "token": token })))
}
