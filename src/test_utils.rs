//! Shared helpers for tests that want a real (in-memory) database.

use crate::{
    config::database,
    core::transaction::create_transaction,
    entities::{TransactionKind, transaction},
    errors::Result,
};
use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseConnection, prelude::DateTimeUtc};

/// Fresh in-memory database with all tables created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = database::create_connection("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Midnight UTC on the given day.
#[must_use]
pub fn test_date(year: i32, month: u32, day: u32) -> DateTimeUtc {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// An expense of `amount` in the "lunch" category, dated 2024-01-15.
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    owner: &str,
    amount: f64,
) -> Result<transaction::Model> {
    create_full_transaction(
        db,
        owner,
        amount,
        "lunch",
        TransactionKind::Expense,
        test_date(2024, 1, 15),
    )
    .await
}

/// An expense of `amount` in the "lunch" category on the given date.
pub async fn create_dated_transaction(
    db: &DatabaseConnection,
    owner: &str,
    amount: f64,
    date: DateTimeUtc,
) -> Result<transaction::Model> {
    create_full_transaction(db, owner, amount, "lunch", TransactionKind::Expense, date).await
}

/// A transaction with every field chosen by the caller.
pub async fn create_full_transaction(
    db: &DatabaseConnection,
    owner: &str,
    amount: f64,
    category: &str,
    kind: TransactionKind,
    date: DateTimeUtc,
) -> Result<transaction::Model> {
    create_transaction(db, owner, amount, category, kind, date).await
}
