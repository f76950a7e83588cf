//! Filtered retrieval of a user's transactions.
//!
//! Builds a conjunctive predicate over the owner and the optional filters and
//! returns the full matching set ordered by date descending (newest first).
//! There is no pagination: callers receive everything that matched.

use crate::{
    entities::{Transaction, TransactionKind, transaction},
    errors::Result,
};
use sea_orm::{QueryOrder, prelude::*};

/// Optional constraints for [`find_transactions`]. An empty filter matches
/// every transaction the owner has. Date bounds are inclusive; a missing
/// bound leaves that side unbounded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Exact-match category
    pub category: Option<String>,
    /// Transaction type
    pub kind: Option<TransactionKind>,
    /// Inclusive lower date bound
    pub date_from: Option<DateTimeUtc>,
    /// Inclusive upper date bound
    pub date_to: Option<DateTimeUtc>,
}

/// Retrieves all of `owner`'s transactions matching `filter`, newest first.
pub async fn find_transactions(
    db: &DatabaseConnection,
    owner: &str,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find().filter(transaction::Column::Username.eq(owner));

    if let Some(category) = &filter.category {
        query = query.filter(transaction::Column::Category.eq(category));
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

    query
        .order_by_desc(transaction::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}
