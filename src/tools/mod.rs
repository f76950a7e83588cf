//! Tool dispatch layer - one fixed registry of five operations.
//!
//! Every transport (the chat orchestrator, the HTTP transaction routes, and
//! the stdio tool server) funnels through [`args::ToolCall::parse`] and
//! [`registry::dispatch`], so argument validation exists exactly once and the
//! operations behave identically no matter where a request came from.

/// Typed, validated argument bundles - one variant per operation
pub mod args;
/// Operation schemas and execution against the store
pub mod registry;

pub use args::ToolCall;
pub use registry::{dispatch, tool_declarations};
