//! The tool-calling loop behind the conversational assistant.
//!
//! Each round trip sends the conversation to the model and inspects the
//! reply. Plain text ends the conversation; tool calls are executed through
//! the shared dispatch layer and their results appended before the next round
//! trip. The loop is bounded so a model that keeps requesting tools cannot
//! spin forever.
//!
//! The model never controls whose data a tool touches: the authenticated
//! username is written over whatever `username` the model put in the call
//! arguments before dispatch, and id-based mutations are checked against the
//! authenticated owner the same way the HTTP handlers check them.

use crate::{
    chat::model::{Exchange, ModelClient, ModelRequest, Role, ToolInvocation, ToolOutcome},
    core::{context, transaction as tx},
    errors::{Error, Result},
    tools,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Upper bound on model round trips for a single chat request.
pub const MAX_ROUND_TRIPS: usize = 10;

/// How many recent transactions feed the category vocabulary in the
/// system instruction.
const CONTEXT_WINDOW: u64 = 100;

/// One prior turn of the conversation, as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

fn turn_role(raw: &str) -> Role {
    // Clients variously label the model side "model" or "assistant"
    match raw {
        "model" | "assistant" => Role::Model,
        _ => Role::User,
    }
}

fn system_prompt(owner: &str, categories: &[String]) -> String {
    let today = chrono::Utc::now().format("%Y-%m-%d");
    let vocabulary = if categories.is_empty() {
        "The user has no recorded transactions yet.".to_string()
    } else {
        format!(
            "Categories the user has used recently: {}.",
            categories.join(", ")
        )
    };
    format!(
        "You are a personal finance assistant for the user '{owner}'. \
         You help them record, update, and understand their budget and expense \
         transactions by calling the provided tools. Today's date is {today}. \
         {vocabulary} \
         When the user refers to a category loosely, prefer one they already use. \
         Amounts are always positive; the transaction type distinguishes budget \
         from expense. When a date is not given, assume today. Answer concisely \
         and never invent transactions you did not read from a tool."
    )
}

/// Dispatches a parsed call on `owner`'s behalf. Mutations addressed by id
/// must belong to `owner`, mirroring the HTTP handlers.
async fn dispatch_for_owner(
    db: &DatabaseConnection,
    owner: &str,
    call: tools::ToolCall,
) -> Result<Value> {
    if let tools::ToolCall::Update { id, .. } | tools::ToolCall::Delete { id } = &call {
        tx::ensure_owner(db, owner, *id).await?;
    }
    tools::dispatch(db, call).await
}

/// Executes one requested tool call with the authenticated owner forced into
/// the arguments. Failures come back as a structured payload rather than an
/// error so the model can see what went wrong and recover.
async fn execute_call(
    db: &DatabaseConnection,
    owner: &str,
    call: &ToolInvocation,
) -> ToolOutcome {
    let mut args = if call.args.is_object() {
        call.args.clone()
    } else {
        json!({})
    };
    if let Some(map) = args.as_object_mut() {
        map.insert("username".to_string(), Value::String(owner.to_string()));
    }

    let response = match tools::ToolCall::parse(&call.name, &args) {
        Ok(parsed) => match dispatch_for_owner(db, owner, parsed).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Tool '{}' failed: {err}", call.name);
                json!({ "success": false, "error": err.to_string() })
            }
        },
        Err(err) => {
            warn!("Tool '{}' rejected: {err}", call.name);
            json!({ "success": false, "error": err.to_string() })
        }
    };

    ToolOutcome {
        name: call.name.clone(),
        response,
    }
}

/// Runs one chat request to completion and returns the assistant's reply.
///
/// `owner` is the authenticated username; `history` is the client's view of
/// the prior conversation. Fails when the message is empty or when the model
/// is still requesting tools after [`MAX_ROUND_TRIPS`] round trips.
pub async fn run_chat<M: ModelClient>(
    db: &DatabaseConnection,
    model: &M,
    owner: &str,
    message: &str,
    history: &[ChatTurn],
) -> Result<String> {
    if message.trim().is_empty() {
        return Err(Error::validation("Message is required"));
    }

    let categories = context::recent_categories(db, owner, CONTEXT_WINDOW).await?;
    let mut request = ModelRequest {
        system: system_prompt(owner, &categories),
        exchanges: Vec::with_capacity(history.len() + 1),
    };
    for turn in history {
        request.exchanges.push(Exchange::Text {
            role: turn_role(&turn.role),
            text: turn.content.clone(),
        });
    }
    request.exchanges.push(Exchange::Text {
        role: Role::User,
        text: message.trim().to_string(),
    });

    for round_trip in 1..=MAX_ROUND_TRIPS {
        let reply = model.send(request.clone()).await?;

        if reply.tool_calls.is_empty() {
            info!("Chat for '{owner}' finished after {round_trip} round trip(s)");
            return Ok(reply
                .text
                .unwrap_or_else(|| "I'm not sure how to respond to that.".to_string()));
        }

        info!(
            "Model requested {} tool call(s) on round trip {round_trip}",
            reply.tool_calls.len()
        );
        let mut outcomes = Vec::with_capacity(reply.tool_calls.len());
        for call in &reply.tool_calls {
            outcomes.push(execute_call(db, owner, call).await);
        }
        request.exchanges.push(Exchange::ToolRequests(reply.tool_calls));
        request.exchanges.push(Exchange::ToolResults(outcomes));
    }

    warn!("Chat for '{owner}' exceeded {MAX_ROUND_TRIPS} round trips");
    Err(Error::Model {
        message: "The assistant could not complete the request".to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        chat::model::ModelReply,
        core::query::{TransactionFilter, find_transactions},
        test_utils::{create_test_transaction, setup_test_db},
    };
    use std::sync::Mutex;

    /// Plays back a fixed sequence of replies and records every request.
    struct ScriptedModel {
        replies: Mutex<Vec<ModelReply>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<ModelReply>) -> Self {
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn text(text: &str) -> ModelReply {
            ModelReply {
                text: Some(text.to_string()),
                tool_calls: vec![],
            }
        }

        fn call(name: &str, args: Value) -> ModelReply {
            ModelReply {
                text: None,
                tool_calls: vec![ToolInvocation {
                    name: name.to_string(),
                    args,
                }],
            }
        }
    }

    impl ModelClient for ScriptedModel {
        async fn send(&self, request: ModelRequest) -> Result<ModelReply> {
            self.requests.lock().unwrap().push(request);
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                // Past the end of the script the model keeps asking for tools
                Ok(Self::call("list_transactions", json!({})))
            } else {
                Ok(replies.remove(0))
            }
        }
    }

    #[tokio::test]
    async fn test_text_reply_ends_the_conversation() -> Result<()> {
        let db = setup_test_db().await?;
        let model = ScriptedModel::new(vec![ScriptedModel::text("Hello there")]);

        let reply = run_chat(&db, &model, "alice", "hi", &[]).await?;
        assert_eq!(reply, "Hello there");
        assert_eq!(model.requests.lock().unwrap().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_forged_owner_is_overwritten() -> Result<()> {
        let db = setup_test_db().await?;
        let model = ScriptedModel::new(vec![
            ScriptedModel::call(
                "create_transaction",
                json!({
                    "username": "mallory",
                    "amount": 25,
                    "category": "lunch",
                    "type": "expense",
                    "date": "2024-06-01",
                }),
            ),
            ScriptedModel::text("Recorded it."),
        ]);

        let reply = run_chat(&db, &model, "alice", "log 25 for lunch", &[]).await?;
        assert_eq!(reply, "Recorded it.");

        // The write landed under the authenticated user, not the forged one
        let alice = find_transactions(&db, "alice", &TransactionFilter::default()).await?;
        assert_eq!(alice.len(), 1);
        let mallory = find_transactions(&db, "mallory", &TransactionFilter::default()).await?;
        assert!(mallory.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_mutations_on_another_owners_id_are_refused() -> Result<()> {
        let db = setup_test_db().await?;
        let bobs = create_test_transaction(&db, "bob", 30.0).await?;
        let model = ScriptedModel::new(vec![
            ScriptedModel::call(
                "delete_transaction",
                json!({ "transactionId": bobs.id }),
            ),
            ScriptedModel::call(
                "update_transaction",
                json!({ "transactionId": bobs.id, "amount": 1.0 }),
            ),
            ScriptedModel::text("That transaction isn't yours."),
        ]);

        run_chat(&db, &model, "alice", "delete my last transaction", &[]).await?;

        // Bob's record survives both attempts, untouched
        let bob = find_transactions(&db, "bob", &TransactionFilter::default()).await?;
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0], bobs);

        // Each refusal went back to the model as a structured failure
        let requests = model.requests.lock().unwrap();
        for request in &requests[1..] {
            let Some(Exchange::ToolResults(outcomes)) = request.exchanges.last() else {
                panic!("expected tool results feeding the next round trip");
            };
            assert_eq!(outcomes[0].response["success"], json!(false));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back_not_fatal() -> Result<()> {
        let db = setup_test_db().await?;
        let model = ScriptedModel::new(vec![
            ScriptedModel::call("summon_accountant", json!({})),
            ScriptedModel::text("Sorry, I can't do that."),
        ]);

        let reply = run_chat(&db, &model, "alice", "help", &[]).await?;
        assert_eq!(reply, "Sorry, I can't do that.");

        // The second request carries a structured failure for the bad call
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let Some(Exchange::ToolResults(outcomes)) = requests[1].exchanges.last() else {
            panic!("expected tool results at the end of the second request");
        };
        assert_eq!(outcomes[0].name, "summon_accountant");
        assert_eq!(outcomes[0].response["success"], json!(false));

        Ok(())
    }

    #[tokio::test]
    async fn test_round_trip_bound_is_enforced() -> Result<()> {
        let db = setup_test_db().await?;
        // Empty script: every reply asks for another tool call
        let model = ScriptedModel::new(vec![]);

        let result = run_chat(&db, &model, "alice", "loop forever", &[]).await;
        assert!(matches!(result.unwrap_err(), Error::Model { message: _ }));
        assert_eq!(model.requests.lock().unwrap().len(), MAX_ROUND_TRIPS);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let model = ScriptedModel::new(vec![]);

        let result = run_chat(&db, &model, "alice", "   ", &[]).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
        assert!(model.requests.lock().unwrap().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_system_prompt_carries_recent_categories() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_transaction(&db, "alice", 10.0).await?;
        let model = ScriptedModel::new(vec![ScriptedModel::text("ok")]);

        run_chat(&db, &model, "alice", "hi", &[]).await?;

        let requests = model.requests.lock().unwrap();
        assert!(requests[0].system.contains("alice"));
        // create_test_transaction files everything under "lunch"
        assert!(requests[0].system.contains("lunch"));

        Ok(())
    }

    #[tokio::test]
    async fn test_history_precedes_the_new_message() -> Result<()> {
        let db = setup_test_db().await?;
        let model = ScriptedModel::new(vec![ScriptedModel::text("ok")]);

        let history = vec![
            ChatTurn {
                role: "user".to_string(),
                content: "earlier question".to_string(),
            },
            ChatTurn {
                role: "assistant".to_string(),
                content: "earlier answer".to_string(),
            },
        ];
        run_chat(&db, &model, "alice", "new question", &history).await?;

        let requests = model.requests.lock().unwrap();
        let exchanges = &requests[0].exchanges;
        assert_eq!(exchanges.len(), 3);
        assert!(matches!(
            &exchanges[1],
            Exchange::Text { role: Role::Model, text } if text == "earlier answer"
        ));
        assert!(matches!(
            &exchanges[2],
            Exchange::Text { role: Role::User, text } if text == "new question"
        ));

        Ok(())
    }
}
