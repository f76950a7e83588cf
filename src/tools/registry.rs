//! The operation registry: machine-readable schemas for the model plus the
//! executor that runs a validated [`ToolCall`] against the store.
//!
//! Responses are JSON objects with a `success` flag so that callers (and the
//! model, which reads these payloads verbatim) can distinguish outcomes
//! without inspecting HTTP status codes.

use crate::{
    core::{query, summary, transaction as tx},
    errors::Result,
    tools::ToolCall,
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tracing::debug;

/// Schemas for the five registered operations, in the function-declaration
/// shape the model API expects. The `username` parameter is declared so the
/// model produces well-formed calls, but trusted transports overwrite it with
/// the authenticated identity before dispatch.
#[must_use]
pub fn tool_declarations() -> Value {
    json!([
        {
            "name": "list_transactions",
            "description": "List the user's transactions, optionally filtered by category, type, or an inclusive date range.",
            "parameters": {
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "Owner of the transactions" },
                    "category": { "type": "string", "description": "Exact category to match" },
                    "type": { "type": "string", "enum": ["budget", "expense"], "description": "Transaction type" },
                    "startDate": { "type": "string", "description": "Inclusive lower date bound (YYYY-MM-DD)" },
                    "endDate": { "type": "string", "description": "Inclusive upper date bound (YYYY-MM-DD)" },
                },
                "required": ["username"],
            },
        },
        {
            "name": "create_transaction",
            "description": "Record a new budget or expense transaction.",
            "parameters": {
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "Owner of the transaction" },
                    "amount": { "type": "number", "description": "Positive amount" },
                    "category": { "type": "string", "description": "Category label, e.g. groceries" },
                    "type": { "type": "string", "enum": ["budget", "expense"], "description": "Transaction type" },
                    "date": { "type": "string", "description": "Transaction date (YYYY-MM-DD)" },
                },
                "required": ["username", "amount", "category", "type", "date"],
            },
        },
        {
            "name": "update_transaction",
            "description": "Change the amount, category, or type of an existing transaction. At least one field must be provided.",
            "parameters": {
                "type": "object",
                "properties": {
                    "transactionId": { "type": "number", "description": "Id of the transaction to update" },
                    "amount": { "type": "number", "description": "New positive amount" },
                    "category": { "type": "string", "description": "New category label" },
                    "type": { "type": "string", "enum": ["budget", "expense"], "description": "New transaction type" },
                },
                "required": ["transactionId"],
            },
        },
        {
            "name": "delete_transaction",
            "description": "Permanently delete a transaction by id.",
            "parameters": {
                "type": "object",
                "properties": {
                    "transactionId": { "type": "number", "description": "Id of the transaction to delete" },
                },
                "required": ["transactionId"],
            },
        },
        {
            "name": "get_summary",
            "description": "Aggregate the user's transactions: totals, per-category breakdown, and per-type totals. Optionally scoped by categories, type, or an inclusive date range.",
            "parameters": {
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "Owner of the transactions" },
                    "categories": { "type": "array", "items": { "type": "string" }, "description": "Match any of these categories" },
                    "type": { "type": "string", "enum": ["budget", "expense"], "description": "Transaction type" },
                    "startDate": { "type": "string", "description": "Inclusive lower date bound (YYYY-MM-DD)" },
                    "endDate": { "type": "string", "description": "Inclusive upper date bound (YYYY-MM-DD)" },
                },
                "required": ["username"],
            },
        },
    ])
}

/// Executes a validated tool call and returns its JSON response payload.
pub async fn dispatch(db: &DatabaseConnection, call: ToolCall) -> Result<Value> {
    match call {
        ToolCall::List { username, filter } => {
            debug!("Dispatching list_transactions for '{username}'");
            let transactions = query::find_transactions(db, &username, &filter).await?;
            Ok(json!({
                "success": true,
                "count": transactions.len(),
                "transactions": transactions,
            }))
        }
        ToolCall::Create {
            username,
            amount,
            category,
            kind,
            date,
        } => {
            debug!("Dispatching create_transaction for '{username}'");
            let created =
                tx::create_transaction(db, &username, amount, &category, kind, date).await?;
            Ok(json!({
                "success": true,
                "message": "Transaction created successfully",
                "transaction": created,
            }))
        }
        ToolCall::Update {
            id,
            amount,
            category,
            kind,
        } => {
            debug!("Dispatching update_transaction for id {id}");
            let updated =
                tx::update_transaction(db, id, amount, category.as_deref(), kind).await?;
            Ok(json!({
                "success": true,
                "message": "Transaction updated successfully",
                "transaction": updated,
            }))
        }
        ToolCall::Delete { id } => {
            debug!("Dispatching delete_transaction for id {id}");
            let deleted = tx::delete_transaction(db, id).await?;
            Ok(json!({
                "success": true,
                "message": "Transaction deleted successfully",
                "transaction": deleted,
            }))
        }
        ToolCall::Summarize { username, filter } => {
            debug!("Dispatching get_summary for '{username}'");
            let (summary, transactions) = summary::summarize(db, &username, &filter).await?;
            Ok(json!({
                "success": true,
                "summary": summary,
                "transactions": transactions,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use serde_json::json;

    async fn dispatch_named(
        db: &DatabaseConnection,
        name: &str,
        args: Value,
    ) -> Result<Value> {
        dispatch(db, ToolCall::parse(name, &args)?).await
    }

    #[test]
    fn test_declarations_cover_the_five_operations() {
        let declared: Vec<String> = tool_declarations()
            .as_array()
            .unwrap()
            .iter()
            .map(|decl| decl["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            declared,
            vec![
                "list_transactions",
                "create_transaction",
                "update_transaction",
                "delete_transaction",
                "get_summary",
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_create_then_list() -> Result<()> {
        let db = setup_test_db().await?;

        let created = dispatch_named(
            &db,
            "create_transaction",
            json!({
                "username": "alice",
                "amount": 42.5,
                "category": "lunch",
                "type": "expense",
                "date": "2024-01-15",
            }),
        )
        .await?;
        assert_eq!(created["success"], json!(true));
        assert_eq!(created["transaction"]["category"], json!("lunch"));

        let listed = dispatch_named(&db, "list_transactions", json!({ "username": "alice" }))
            .await?;
        assert_eq!(listed["count"], json!(1));
        assert_eq!(listed["transactions"][0]["amount"], json!(42.5));

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_invalid_create_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;

        let result = dispatch_named(
            &db,
            "create_transaction",
            json!({
                "username": "alice",
                "amount": -5,
                "category": "lunch",
                "type": "expense",
                "date": "2024-01-15",
            }),
        )
        .await;
        assert!(result.is_err());

        let listed = dispatch_named(&db, "list_transactions", json!({ "username": "alice" }))
            .await?;
        assert_eq!(listed["count"], json!(0));

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_update_and_delete_round_trip() -> Result<()> {
        let db = setup_test_db().await?;

        let created = dispatch_named(
            &db,
            "create_transaction",
            json!({
                "username": "alice",
                "amount": 10,
                "category": "lunch",
                "type": "expense",
                "date": "2024-01-15",
            }),
        )
        .await?;
        let id = created["transaction"]["id"].as_i64().unwrap();

        let updated = dispatch_named(
            &db,
            "update_transaction",
            json!({ "transactionId": id, "amount": 12.5 }),
        )
        .await?;
        assert_eq!(updated["transaction"]["amount"], json!(12.5));
        // Untouched fields survive the partial update
        assert_eq!(updated["transaction"]["category"], json!("lunch"));

        let deleted =
            dispatch_named(&db, "delete_transaction", json!({ "transactionId": id })).await?;
        assert_eq!(deleted["message"], json!("Transaction deleted successfully"));

        let listed = dispatch_named(&db, "list_transactions", json!({ "username": "alice" }))
            .await?;
        assert_eq!(listed["count"], json!(0));

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_summary_shape() -> Result<()> {
        let db = setup_test_db().await?;

        for (amount, category, kind) in [
            (100.0, "salary", "budget"),
            (30.0, "lunch", "expense"),
            (20.0, "lunch", "expense"),
        ] {
            dispatch_named(
                &db,
                "create_transaction",
                json!({
                    "username": "alice",
                    "amount": amount,
                    "category": category,
                    "type": kind,
                    "date": "2024-01-15",
                }),
            )
            .await?;
        }

        let response = dispatch_named(&db, "get_summary", json!({ "username": "alice" })).await?;
        let summary = &response["summary"];
        assert_eq!(summary["totalTransactions"], json!(3));
        assert_eq!(summary["byCategory"]["lunch"]["count"], json!(2));
        assert_eq!(response["transactions"].as_array().unwrap().len(), 3);

        Ok(())
    }
}
