//! Recent-category context for the conversational assistant.
//!
//! The orchestrator embeds the caller's category vocabulary into the model's
//! system instruction so vague references ("food spending") can be mapped
//! onto categories the user actually has. The context endpoint reuses the
//! same scan with a smaller window.

use crate::{
    entities::{Transaction, transaction},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};

/// Scans the owner's `limit` most recent transactions (by date) and returns
/// their distinct categories in order of first appearance, plus the number
/// of transactions scanned.
pub async fn recent_activity(
    db: &DatabaseConnection,
    owner: &str,
    limit: u64,
) -> Result<(Vec<String>, usize)> {
    let recent = Transaction::find()
        .filter(transaction::Column::Username.eq(owner))
        .order_by_desc(transaction::Column::Date)
        .limit(limit)
        .all(db)
        .await?;

    let mut categories = Vec::new();
    for tx in &recent {
        if !categories.contains(&tx.category) {
            categories.push(tx.category.clone());
        }
    }

    Ok((categories, recent.len()))
}

/// Distinct categories across the owner's `limit` most recent transactions.
pub async fn recent_categories(
    db: &DatabaseConnection,
    owner: &str,
    limit: u64,
) -> Result<Vec<String>> {
    let (categories, _) = recent_activity(db, owner, limit).await?;
    Ok(categories)
}
