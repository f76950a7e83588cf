//! The assistant endpoint and its context companion.
//!
//! Chat is gated twice before any model traffic happens: a per-IP rate limit
//! (twenty requests per minute) and the `ai_chat_assistant` feature flag.
//! The flag client fails closed, so an unreachable flag service disables the
//! assistant rather than exposing it.

use std::{net::SocketAddr, sync::Arc};

use crate::{
    api::{AppState, extract::AuthUser},
    chat::{self, ChatTurn},
    core::context,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{ConnectInfo, Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

/// Flag that must be enabled for the assistant to answer.
pub const CHAT_FLAG: &str = "ai_chat_assistant";

/// How many recent transactions the context endpoint scans.
const CONTEXT_LIMIT: u64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
}

/// `POST /chat/message`
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    AuthUser(user): AuthUser,
    Json(body): Json<ChatRequest>,
) -> Result<impl IntoResponse> {
    state.chat_limiter.check(addr.ip())?;

    let status = state
        .flags
        .is_feature_enabled(CHAT_FLAG, &user.id.to_string())
        .await;
    if !status.enabled {
        return Err(Error::FeatureDisabled);
    }

    let model = state.model.as_ref().ok_or_else(|| Error::Config {
        message: "The assistant is not configured".to_string(),
    })?;

    let reply = chat::run_chat(
        &state.db,
        model,
        &user.username,
        &body.message,
        &body.conversation_history,
    )
    .await?;

    Ok(Json(json!({ "success": true, "response": reply })))
}

/// `GET /chat/context/{username}`
pub async fn chat_context(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    if username != user.username {
        return Err(Error::Forbidden);
    }

    let (categories, count) =
        context::recent_activity(&state.db, &user.username, CONTEXT_LIMIT).await?;
    Ok(Json(json!({
        "success": true,
        "categories": categories,
        "recentTransactionsCount": count,
    })))
}
