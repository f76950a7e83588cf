//! User entity - Registered accounts.
//!
//! The `username` doubles as the foreign key for transactions (denormalized by
//! design). The password hash never leaves the server: it is skipped during
//! serialization.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Stable identifier carried in session tokens
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique login name; also the owner key on transactions
    #[sea_orm(unique)]
    pub username: String,
    /// Unique email address (basic `local@domain` shape enforced at registration)
    #[sea_orm(unique)]
    pub email: String,
    /// Bcrypt hash of the password; never exposed
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
