//! Conversational assistant built on model tool-calling.
//!
//! [`model`] defines the transport-neutral conversation types and the
//! [`model::ModelClient`] trait, plus the concrete Gemini-backed client.
//! [`orchestrator`] drives the request loop: it sends the conversation to the
//! model, executes any tool calls the model asks for, feeds the results back,
//! and repeats until the model answers in plain text or the round-trip bound
//! is hit.

/// Conversation types, the model client trait, and the Gemini client
pub mod model;
/// The tool-calling loop
pub mod orchestrator;

pub use model::{GeminiClient, ModelClient, ModelReply, ModelRequest};
pub use orchestrator::{ChatTurn, MAX_ROUND_TRIPS, run_chat};
