//! Transaction business logic - validated create, update, and delete.
//!
//! All mutations validate their inputs before touching the store, so a failed
//! operation never leaves a partial write behind. Categories are sanitized by
//! stripping angle brackets to prevent markup injection when they are later
//! rendered. Deletes are unrecoverable: there is no soft-delete or audit trail.

use crate::{
    entities::{Transaction, TransactionKind, transaction},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Strips `<` and `>` from a category and trims surrounding whitespace.
#[must_use]
pub fn sanitize_category(raw: &str) -> String {
    raw.trim().replace(['<', '>'], "")
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::validation("Amount must be a positive number"));
    }
    Ok(())
}

/// Creates a new transaction for `username`.
///
/// Validates that the owner is non-empty, the amount is positive and finite,
/// and the category is non-empty after trimming. The `kind` and `date` are
/// already well-typed by the time they reach this function; rejecting unknown
/// type strings or unparseable dates is the job of the validation boundary in
/// [`crate::tools::args`].
pub async fn create_transaction(
    db: &DatabaseConnection,
    username: &str,
    amount: f64,
    category: &str,
    kind: TransactionKind,
    date: DateTimeUtc,
) -> Result<transaction::Model> {
    if username.trim().is_empty() {
        return Err(Error::validation("Valid username is required"));
    }
    validate_amount(amount)?;

    let category = sanitize_category(category);
    if category.is_empty() {
        return Err(Error::validation("Category is required"));
    }

    let now = chrono::Utc::now();
    let model = transaction::ActiveModel {
        username: Set(username.trim().to_string()),
        amount: Set(amount),
        category: Set(category),
        kind: Set(kind),
        date: Set(date),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    info!(
        "Created transaction {} for {}: {} {:.2} in '{}'",
        result.id,
        result.username,
        result.kind.as_str(),
        result.amount,
        result.category
    );
    Ok(result)
}

/// Partially updates a transaction: only supplied fields change.
///
/// At least one of `amount`, `category`, or `kind` must be present, and each
/// supplied field is validated exactly as it would be on create. The update
/// is rejected before any store mutation when validation fails.
pub async fn update_transaction(
    db: &DatabaseConnection,
    id: i64,
    amount: Option<f64>,
    category: Option<&str>,
    kind: Option<TransactionKind>,
) -> Result<transaction::Model> {
    if amount.is_none() && category.is_none() && kind.is_none() {
        return Err(Error::validation(
            "At least one of amount, category, or type must be provided",
        ));
    }

    if let Some(amount) = amount {
        validate_amount(amount)?;
    }

    let category = match category {
        Some(raw) => {
            let sanitized = sanitize_category(raw);
            if sanitized.is_empty() {
                return Err(Error::validation("Category cannot be empty"));
            }
            Some(sanitized)
        }
        None => None,
    };

    let existing = Transaction::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound)?;

    let mut active: transaction::ActiveModel = existing.into();
    if let Some(amount) = amount {
        active.amount = Set(amount);
    }
    if let Some(category) = category {
        active.category = Set(category);
    }
    if let Some(kind) = kind {
        active.kind = Set(kind);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(db).await?;
    info!("Updated transaction {}", updated.id);
    Ok(updated)
}

/// Deletes a transaction by id, returning the deleted record.
pub async fn delete_transaction(db: &DatabaseConnection, id: i64) -> Result<transaction::Model> {
    let existing = Transaction::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound)?;

    let deleted = existing.clone();
    existing.delete(db).await?;
    info!("Deleted transaction {}", deleted.id);
    Ok(deleted)
}

/// Confirms the transaction exists and belongs to `owner`. Id-based
/// mutations on untrusted transports go through this before dispatch so no
/// caller can touch another owner's records by guessing ids.
pub async fn ensure_owner(db: &DatabaseConnection, owner: &str, id: i64) -> Result<()> {
    let existing = Transaction::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound)?;
    if existing.username != owner {
        return Err(Error::Forbidden);
    }
    Ok(())
}

/// Retrieves a transaction by its unique id, `None` when it does not exist.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(id).one(db).await.map_err(Into::into)
}
