//! Validated argument bundles for the tool registry.
//!
//! Tool arguments arrive as loose JSON from whichever transport received them
//! (model function calls, HTTP bodies, stdio requests). [`ToolCall::parse`]
//! is the single boundary that turns that JSON into a typed variant; past
//! this point amounts are numbers, kinds are enum values, and dates are real
//! instants. Amount positivity and category emptiness are enforced by the
//! core mutation functions so the rules exist in one place.

use crate::{
    core::{query::TransactionFilter, summary::SummaryFilter},
    entities::TransactionKind,
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::DateTimeUtc;
use serde_json::Value;

/// One validated tool invocation. The variants mirror the five registered
/// operations; constructing one is only possible through [`ToolCall::parse`]
/// or by supplying already-typed fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// `list_transactions`
    List {
        username: String,
        filter: TransactionFilter,
    },
    /// `create_transaction`
    Create {
        username: String,
        amount: f64,
        category: String,
        kind: TransactionKind,
        date: DateTimeUtc,
    },
    /// `update_transaction`
    Update {
        id: i64,
        amount: Option<f64>,
        category: Option<String>,
        kind: Option<TransactionKind>,
    },
    /// `delete_transaction`
    Delete { id: i64 },
    /// `get_summary`
    Summarize {
        username: String,
        filter: SummaryFilter,
    },
}

/// Parses a date argument: either RFC 3339 or a plain `YYYY-MM-DD`
/// (interpreted as midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTimeUtc> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::validation("Valid date is required"))
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn required_str(args: &Value, key: &str, message: &str) -> Result<String> {
    match str_arg(args, key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::validation(message)),
    }
}

/// Amounts may arrive as JSON numbers or numeric strings depending on the
/// transport; both are accepted.
fn amount_arg(args: &Value, key: &str) -> Option<f64> {
    match args.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn id_arg(args: &Value, key: &str) -> Result<i64> {
    let id = match args.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| Error::validation("Transaction ID is required"))
}

fn kind_arg(args: &Value, key: &str) -> Result<Option<TransactionKind>> {
    match str_arg(args, key) {
        None => Ok(None),
        Some(raw) => TransactionKind::parse(raw).map(Some).ok_or_else(|| {
            Error::validation("Type must be either \"budget\" or \"expense\"")
        }),
    }
}

fn date_arg(args: &Value, key: &str) -> Result<Option<DateTimeUtc>> {
    match str_arg(args, key) {
        None => Ok(None),
        Some(raw) => parse_date(raw).map(Some),
    }
}

impl ToolCall {
    /// Validates a named operation and its JSON argument bundle.
    /// Unrecognized operation names fail with [`Error::UnknownTool`].
    pub fn parse(name: &str, args: &Value) -> Result<Self> {
        match name {
            "list_transactions" => Ok(Self::List {
                username: required_str(args, "username", "Valid username is required")?,
                filter: TransactionFilter {
                    category: str_arg(args, "category").map(str::to_string),
                    kind: kind_arg(args, "type")?,
                    date_from: date_arg(args, "startDate")?,
                    date_to: date_arg(args, "endDate")?,
                },
            }),
            "create_transaction" => {
                let username = required_str(args, "username", "Valid username is required")?;
                let amount = amount_arg(args, "amount")
                    .ok_or_else(|| Error::validation("Amount must be a positive number"))?;
                let category = required_str(args, "category", "Category is required")?;
                let kind = kind_arg(args, "type")?.ok_or_else(|| {
                    Error::validation("Type must be either \"budget\" or \"expense\"")
                })?;
                let date = str_arg(args, "date")
                    .ok_or_else(|| Error::validation("Valid date is required"))
                    .and_then(parse_date)?;
                Ok(Self::Create {
                    username,
                    amount,
                    category,
                    kind,
                    date,
                })
            }
            "update_transaction" => Ok(Self::Update {
                id: id_arg(args, "transactionId")?,
                amount: amount_arg(args, "amount"),
                category: str_arg(args, "category").map(str::to_string),
                kind: kind_arg(args, "type")?,
            }),
            "delete_transaction" => Ok(Self::Delete {
                id: id_arg(args, "transactionId")?,
            }),
            "get_summary" => {
                let categories = match args.get("categories") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    _ => Vec::new(),
                };
                Ok(Self::Summarize {
                    username: required_str(args, "username", "Valid username is required")?,
                    filter: SummaryFilter {
                        categories,
                        kind: kind_arg(args, "type")?,
                        date_from: date_arg(args, "startDate")?,
                        date_to: date_arg(args, "endDate")?,
                    },
                })
            }
            other => Err(Error::UnknownTool {
                name: other.to_string(),
            }),
        }
    }
}
