//! Aggregated summaries over a user's transactions.
//!
//! Summaries accumulate with `rust_decimal` so that totals stay exact at
//! currency precision no matter how many terms are added; floating-point
//! drift from repeated `f64` addition never reaches a caller. The category
//! filter here is a match-any set, unlike the single-value filter in
//! [`crate::core::query`].

use std::collections::BTreeMap;

use crate::{
    entities::{Transaction, TransactionKind, transaction},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;

/// Constraints for [`summarize`]. An empty `categories` set means "all
/// categories"; a non-empty set matches any of its members.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SummaryFilter {
    /// Match-any category set
    pub categories: Vec<String>,
    /// Transaction type
    pub kind: Option<TransactionKind>,
    /// Inclusive lower date bound
    pub date_from: Option<DateTimeUtc>,
    /// Inclusive upper date bound
    pub date_to: Option<DateTimeUtc>,
}

/// Count and amount total for one category value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub count: u64,
    pub total: Decimal,
}

/// Amount totals per transaction type; absent types stay at zero.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TypeTotals {
    pub budget: Decimal,
    pub expense: Decimal,
}

/// Aggregates computed over the matched set.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_transactions: u64,
    pub total_amount: Decimal,
    pub by_category: BTreeMap<String, CategoryBreakdown>,
    pub by_type: TypeTotals,
}

/// Converts a stored amount to a currency-precision decimal.
/// Amounts are validated finite on the way in, so the retain never fails
/// in practice; a non-finite stored value degrades to zero rather than
/// panicking.
fn to_currency(amount: f64) -> Decimal {
    Decimal::from_f64_retain(amount)
        .unwrap_or_default()
        .round_dp(2)
}

/// Computes the summary for `owner` under `filter`, returning both the
/// aggregates and the matched transactions (newest first). A filter that
/// matches nothing yields a zero-filled summary, not an error.
pub async fn summarize(
    db: &DatabaseConnection,
    owner: &str,
    filter: &SummaryFilter,
) -> Result<(Summary, Vec<transaction::Model>)> {
    let mut query = Transaction::find().filter(transaction::Column::Username.eq(owner));

    if !filter.categories.is_empty() {
        query = query.filter(transaction::Column::Category.is_in(filter.categories.clone()));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(transaction::Column::Kind.eq(kind));
    }
    if let Some(from) = filter.date_from {
        query = query.filter(transaction::Column::Date.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(transaction::Column::Date.lte(to));
    }

    let transactions = query
        .order_by_desc(transaction::Column::Date)
        .all(db)
        .await?;

    let mut summary = Summary {
        total_transactions: transactions.len() as u64,
        ..Default::default()
    };

    for tx in &transactions {
        let amount = to_currency(tx.amount);
        summary.total_amount += amount;

        let entry = summary.by_category.entry(tx.category.clone()).or_default();
        entry.count += 1;
        entry.total += amount;

        match tx.kind {
            TransactionKind::Budget => summary.by_type.budget += amount,
            TransactionKind::Expense => summary.by_type.expense += amount,
        }
    }

    Ok((summary, transactions))
}
