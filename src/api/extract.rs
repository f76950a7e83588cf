//! Request extractor for the authenticated user.
//!
//! Handlers that name [`AuthUser`] as a parameter only run once the bearer
//! token has been verified and resolved to a live account; everything else is
//! rejected with a 401 before the handler body executes.

use std::sync::Arc;

use crate::{
    api::AppState,
    auth,
    entities::user,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};

/// The account resolved from the request's `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Unauthorized {
                message: "Authorization header is required".to_string(),
            })?;

        // Accept both "Bearer <token>" and a bare token
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        let claims = auth::verify_token(token, &state.config.jwt_secret)?;

        let user = auth::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| Error::Unauthorized {
                message: "Account no longer exists".to_string(),
            })?;

        Ok(Self(user))
    }
}
