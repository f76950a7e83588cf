//! Transaction entity - Represents all income and expense records in the system.
//!
//! Each transaction carries the owner's `username` (a plain string key, exact-match
//! and case-sensitive - not a relational reference), a positive `amount`, a
//! sanitized `category`, a `kind` (`budget` = income, `expense` = outflow), the
//! caller-supplied `date`, and store-managed creation/update timestamps.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the transaction, assigned by the store
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Username of the owner. Invariant: non-empty, matched exactly.
    pub username: String,
    /// Transaction amount. Invariant: always > 0 and finite.
    pub amount: f64,
    /// Free-text category with `<` and `>` stripped before storage
    pub category: String,
    /// Whether this is income (`budget`) or an outflow (`expense`)
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Caller-supplied transaction date (distinct from `created_at`)
    pub date: DateTimeUtc,
    /// When the record was inserted
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Transaction type. `budget` denotes income/inflow despite the name,
/// matching the vocabulary the client and the model tools use.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Income / inflow
    #[sea_orm(string_value = "budget")]
    Budget,
    /// Spending / outflow
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl TransactionKind {
    /// Parses the wire value, returning `None` for anything outside
    /// `{budget, expense}`. Rejection of unknown values happens at the
    /// validation boundary so no transport can smuggle in a third kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "budget" => Some(Self::Budget),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// The canonical wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Expense => "expense",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
