//! User registration, login, password hashing, and session tokens.
//!
//! Passwords are hashed with bcrypt (cost 10) and never serialized. Session
//! tokens are HS256 JWTs carrying the user's stable id, valid for seven days.
//! Login failures are deliberately uniform: unknown username and wrong
//! password produce the same error so the endpoint cannot be used to
//! enumerate accounts.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How long an issued session token stays valid.
pub const TOKEN_VALIDITY_DAYS: i64 = 7;

const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LEN: usize = 6;

/// Claims carried in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's stable id
    pub sub: i64,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// The non-secret fields of a user, safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for PublicUser {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

/// Signs a session token for the given user id.
pub fn issue_token(user_id: i64, secret: &str) -> Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now() + chrono::Duration::days(TOKEN_VALIDITY_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| Error::Unauthorized {
        message: "Could not issue token".to_string(),
    })
}

/// Verifies a session token and returns its claims. Expired or tampered
/// tokens are rejected with an authorization error, never a 500.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized {
        message: "Invalid or expired token".to_string(),
    })
}

fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).map_err(Into::into)
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).map_err(Into::into)
}

/// Minimal `local@domain` shape check; anything fancier belongs to a
/// confirmation email, not a regex.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Registers a new user and returns the persisted account plus a session token.
///
/// Rejects with a specific message when the username or email is taken, the
/// email shape is invalid, or the password is shorter than six characters.
pub async fn register(
    db: &DatabaseConnection,
    jwt_secret: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(PublicUser, String)> {
    let username = username.trim();
    let email = email.trim();

    if username.is_empty() {
        return Err(Error::validation("Username is required"));
    }
    if email.is_empty() {
        return Err(Error::validation("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(Error::validation("Email address is not valid"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::validation(
            "Password must be at least 6 characters long",
        ));
    }

    if find_by_username(db, username).await?.is_some() {
        return Err(Error::validation("Username is already registered"));
    }
    let existing_email = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    if existing_email.is_some() {
        return Err(Error::validation("Email is already registered"));
    }

    let model = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let saved = model.insert(db).await?;
    info!("Registered user '{}'", saved.username);

    let token = issue_token(saved.id, jwt_secret)?;
    Ok((saved.into(), token))
}

/// Authenticates a user and returns the account plus a fresh session token.
pub async fn login(
    db: &DatabaseConnection,
    jwt_secret: &str,
    username: &str,
    password: &str,
) -> Result<(PublicUser, String)> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(Error::InvalidCredentials);
    }

    // Unknown username and wrong password take the same exit path
    let Some(user) = find_by_username(db, username.trim()).await? else {
        return Err(Error::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash)? {
        return Err(Error::InvalidCredentials);
    }

    info!("User '{}' logged in", user.username);
    let token = issue_token(user.id, jwt_secret)?;
    Ok((user.into(), token))
}

/// Looks up a user by username.
pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks up a user by the stable id carried in a token.
pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(id).one(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SECRET: &str = "test-secret";

    #[tokio::test]
    async fn test_register_then_login_round_trip() -> Result<()> {
        let db = setup_test_db().await?;

        let (user, token) = register(&db, SECRET, "alice", "alice@example.com", "hunter22").await?;
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");

        let claims = verify_token(&token, SECRET)?;
        assert_eq!(claims.sub, user.id);

        let (logged_in, _) = login(&db, SECRET, "alice", "hunter22").await?;
        assert_eq!(logged_in, user);

        Ok(())
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, SECRET, "alice", "alice@example.com", "hunter22").await?;

        let wrong_password = login(&db, SECRET, "alice", "wrong-password")
            .await
            .unwrap_err();
        let unknown_user = login(&db, SECRET, "mallory", "hunter22").await.unwrap_err();

        // Indistinguishable to the caller: same variant, same message
        assert!(matches!(wrong_password, Error::InvalidCredentials));
        assert!(matches!(unknown_user, Error::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());

        Ok(())
    }

    #[tokio::test]
    async fn test_register_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let cases = [
            ("", "a@b.com", "longenough", "empty username"),
            ("bob", "", "longenough", "empty email"),
            ("bob", "not-an-email", "longenough", "bad email"),
            ("bob", "bob@nodot", "longenough", "domain without dot"),
            ("bob", "bob@example.com", "short", "short password"),
        ];
        for (username, email, password, case) in cases {
            let result = register(&db, SECRET, username, email, password).await;
            assert!(
                matches!(result.unwrap_err(), Error::Validation { message: _ }),
                "expected validation error for {case}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, SECRET, "alice", "alice@example.com", "hunter22").await?;

        let dup_username = register(&db, SECRET, "alice", "other@example.com", "hunter22").await;
        assert!(matches!(
            dup_username.unwrap_err(),
            Error::Validation { message: _ }
        ));

        let dup_email = register(&db, SECRET, "alice2", "alice@example.com", "hunter22").await;
        assert!(matches!(
            dup_email.unwrap_err(),
            Error::Validation { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_token_rejects_garbage_and_wrong_secret() -> Result<()> {
        let token = issue_token(42, SECRET)?;

        assert!(verify_token(&token, SECRET).is_ok());
        assert!(verify_token(&token, "other-secret").is_err());
        assert!(verify_token("not-a-token", SECRET).is_err());

        Ok(())
    }
}
