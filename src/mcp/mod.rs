//! Stdio tool server: the second transport over the shared dispatch layer.
//!
//! Speaks newline-delimited JSON-RPC 2.0 over stdin/stdout with two methods,
//! `tools/list` and `tools/call`. This transport is for trusted local
//! integrations launched alongside the process, so the `username` argument in
//! a call is taken as given rather than resolved from a session token.
//! Failures are reported as JSON-RPC errors; the process only stops when
//! stdin closes.

use crate::{errors::Result, tools};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

fn rpc_result(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn rpc_error(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Handles one decoded request and produces the response value.
async fn handle_request(db: &DatabaseConnection, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    match request.get("method").and_then(Value::as_str) {
        Some("tools/list") => rpc_result(id, json!({ "tools": tools::tool_declarations() })),
        Some("tools/call") => {
            let params = request.get("params").cloned().unwrap_or(Value::Null);
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return rpc_error(id, INVALID_PARAMS, "params.name is required");
            };
            let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

            let outcome = match tools::ToolCall::parse(name, &arguments) {
                Ok(call) => tools::dispatch(db, call).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(payload) => rpc_result(id, payload),
                Err(err) => {
                    warn!("Tool call '{name}' failed: {err}");
                    rpc_error(id, INVALID_PARAMS, &err.to_string())
                }
            }
        }
        Some(other) => rpc_error(id, METHOD_NOT_FOUND, &format!("Unknown method: {other}")),
        None => rpc_error(id, METHOD_NOT_FOUND, "method is required"),
    }
}

/// Serves tool requests over stdin/stdout until stdin closes.
pub async fn run_stdio_server(db: DatabaseConnection) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    info!("Tool server listening on stdio");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => handle_request(&db, &request).await,
            Err(err) => rpc_error(Value::Null, PARSE_ERROR, &format!("Invalid JSON: {err}")),
        };
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    info!("Stdin closed; tool server shutting down");
    Ok(())
}
