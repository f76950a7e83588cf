//! Transaction endpoints.
//!
//! These handlers are thin: they assemble a JSON argument bundle from the
//! request and push it through the same [`crate::tools`] parse-and-dispatch
//! path the assistant and the stdio server use, so validation and behavior
//! cannot drift between transports. The authenticated identity always wins:
//! list and summary run for the token's user, and mutations of another
//! user's transaction are refused.

use std::{collections::HashMap, sync::Arc};

use crate::{
    api::{AppState, extract::AuthUser},
    core::transaction::{ensure_owner, get_transaction_by_id},
    errors::{Error, Result},
    tools,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::{Value, json};

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| Error::validation("Transaction ID is required"))
}

/// `GET /transactions/{username}` with optional `category`, `type`,
/// `startDate`, and `endDate` query parameters.
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    if username != user.username {
        return Err(Error::Forbidden);
    }

    let mut args = json!({ "username": user.username });
    if let Some(map) = args.as_object_mut() {
        for key in ["category", "type", "startDate", "endDate"] {
            if let Some(value) = params.get(key) {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
    }

    let call = tools::ToolCall::parse("list_transactions", &args)?;
    Ok(Json(tools::dispatch(&state.db, call).await?))
}

/// `GET /transactions/id/{id}`
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    ensure_owner(&state.db, &user.username, id).await?;

    let transaction = get_transaction_by_id(&state.db, id)
        .await?
        .ok_or(Error::TransactionNotFound)?;
    Ok(Json(json!({ "success": true, "transaction": transaction })))
}

/// `POST /transactions/add`
pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse> {
    if let Some(map) = body.as_object_mut() {
        map.insert(
            "username".to_string(),
            Value::String(user.username.clone()),
        );
    }

    let call = tools::ToolCall::parse("create_transaction", &body)?;
    Ok(Json(tools::dispatch(&state.db, call).await?))
}

/// `PUT /transactions/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    ensure_owner(&state.db, &user.username, id).await?;

    if let Some(map) = body.as_object_mut() {
        map.insert("transactionId".to_string(), json!(id));
    }

    let call = tools::ToolCall::parse("update_transaction", &body)?;
    Ok(Json(tools::dispatch(&state.db, call).await?))
}

/// `DELETE /transactions/{id}`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    ensure_owner(&state.db, &user.username, id).await?;

    let call = tools::ToolCall::parse("delete_transaction", &json!({ "transactionId": id }))?;
    Ok(Json(tools::dispatch(&state.db, call).await?))
}

/// `GET /transactions/{username}/summary` with optional `categories`
/// (comma separated), `type`, `startDate`, and `endDate` query parameters.
pub async fn summary(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    if username != user.username {
        return Err(Error::Forbidden);
    }

    let mut args = json!({ "username": user.username });
    if let Some(map) = args.as_object_mut() {
        for key in ["type", "startDate", "endDate"] {
            if let Some(value) = params.get(key) {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if let Some(raw) = params.get("categories") {
            let categories: Vec<Value> = raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect();
            map.insert("categories".to_string(), Value::Array(categories));
        }
    }

    let call = tools::ToolCall::parse("get_summary", &args)?;
    Ok(Json(tools::dispatch(&state.db, call).await?))
}
