//! Core business logic - framework-agnostic operations over the transaction store.
//!
//! Nothing in this module knows about HTTP, tokens, or the model API. Every
//! function takes a database connection and validated-or-validatable inputs,
//! and returns `Result` so callers decide how failures surface.

/// Recent-category context for the conversational assistant
pub mod context;
/// Filtered retrieval of a user's transactions
pub mod query;
/// Aggregated summaries with exact decimal accumulation
pub mod summary;
/// Validated create/update/delete of transactions
pub mod transaction;
