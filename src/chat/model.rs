//! Model conversation types and the Gemini-backed client.
//!
//! The orchestrator speaks in terms of [`Exchange`] values and the
//! [`ModelClient`] trait; only [`GeminiClient`] knows the provider's wire
//! format. Swapping providers means implementing `ModelClient` once and
//! touching nothing else.

use std::time::Duration;

use crate::{
    config::AppConfig,
    errors::{Error, Result},
    tools,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

/// How long a single model request may take before it is abandoned.
const MODEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub args: Value,
}

/// The result of executing one requested tool call, fed back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub name: String,
    pub response: Value,
}

/// One entry in the conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    /// Plain text from the user or the model
    Text { role: Role, text: String },
    /// Tool calls the model asked for on a previous round
    ToolRequests(Vec<ToolInvocation>),
    /// Execution results for those calls
    ToolResults(Vec<ToolOutcome>),
}

/// A full request to the model: system instruction plus conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub exchanges: Vec<Exchange>,
}

/// What the model sent back: optional text and zero or more tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

/// A client that can run one model round trip. Implementations must be
/// cheap to share across requests.
pub trait ModelClient: Send + Sync {
    /// Sends the conversation and returns the model's reply.
    fn send(&self, request: ModelRequest) -> impl Future<Output = Result<ModelReply>> + Send;
}

/// Client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    system_instruction: WireContent,
    contents: Vec<WireContent>,
    tools: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireContent>,
}

fn text_part(text: &str) -> WirePart {
    WirePart {
        text: Some(text.to_string()),
        function_call: None,
        function_response: None,
    }
}

impl GeminiClient {
    /// Builds a client from the application config. Fails when no API key is
    /// configured.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config.model_api_key.clone().ok_or_else(|| Error::Config {
            message: "GEMINI_API_KEY must be set to use the assistant".to_string(),
        })?;
        let http = reqwest::Client::builder()
            .timeout(MODEL_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.model_base_url.clone(),
            model: config.model_name.clone(),
            api_key,
        })
    }

    fn to_wire(request: &ModelRequest) -> WireRequest {
        let contents = request
            .exchanges
            .iter()
            .map(|exchange| match exchange {
                Exchange::Text { role, text } => WireContent {
                    role: Some(
                        match role {
                            Role::User => "user",
                            Role::Model => "model",
                        }
                        .to_string(),
                    ),
                    parts: vec![text_part(text)],
                },
                Exchange::ToolRequests(calls) => WireContent {
                    role: Some("model".to_string()),
                    parts: calls
                        .iter()
                        .map(|call| WirePart {
                            text: None,
                            function_call: Some(WireFunctionCall {
                                name: call.name.clone(),
                                args: call.args.clone(),
                            }),
                            function_response: None,
                        })
                        .collect(),
                },
                Exchange::ToolResults(outcomes) => WireContent {
                    role: Some("user".to_string()),
                    parts: outcomes
                        .iter()
                        .map(|outcome| WirePart {
                            text: None,
                            function_call: None,
                            function_response: Some(WireFunctionResponse {
                                name: outcome.name.clone(),
                                response: outcome.response.clone(),
                            }),
                        })
                        .collect(),
                },
            })
            .collect();

        WireRequest {
            system_instruction: WireContent {
                role: None,
                parts: vec![text_part(&request.system)],
            },
            contents,
            tools: vec![json!({ "functionDeclarations": tools::tool_declarations() })],
        }
    }

    fn from_wire(response: WireResponse) -> ModelReply {
        let mut reply = ModelReply::default();
        let Some(content) = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
        else {
            return reply;
        };

        let mut text = String::new();
        for part in content.parts {
            if let Some(chunk) = part.text {
                text.push_str(&chunk);
            }
            if let Some(call) = part.function_call {
                reply.tool_calls.push(ToolInvocation {
                    name: call.name,
                    args: call.args,
                });
            }
        }
        if !text.is_empty() {
            reply.text = Some(text);
        }
        reply
    }
}

impl ModelClient for GeminiClient {
    async fn send(&self, request: ModelRequest) -> Result<ModelReply> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("Sending {} exchanges to the model", request.exchanges.len());

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::to_wire(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model {
                message: format!("Model API returned {status}: {body}"),
            });
        }

        let wire: WireResponse = response.json().await?;
        Ok(Self::from_wire(wire))
    }
}
