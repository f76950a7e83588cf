//! `ExpenseBuddy` - a personal expense/budget tracker with an AI assistant
//!
//! This crate provides a complete expense tracking backend: user registration and
//! login, owner-scoped transaction CRUD with aggregated summaries, and a
//! conversational assistant that drives the same operations through model
//! function calling. The five tool operations are exposed over two transports
//! (the HTTP API and a stdio tool server) backed by a single dispatch layer.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    // Documentation - missing docs should be added gradually
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Performance
    clippy::inefficient_to_string,
    clippy::large_types_passed_by_value,
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Complexity and readability
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,
    clippy::too_many_lines,

    // Style consistency
    clippy::enum_glob_use,
    clippy::inconsistent_struct_constructor,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// HTTP interface - routers, handlers, auth extraction, and rate limiting
pub mod api;
/// User registration, login, password hashing, and session tokens
pub mod auth;
/// Conversational orchestrator and model client
pub mod chat;
/// Configuration management for application settings and the database
pub mod config;
/// Core business logic - framework-agnostic transaction, query, and summary operations
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Feature-flag evaluation client (fails closed)
pub mod flags;
/// Stdio tool-server transport over the tool dispatch layer
pub mod mcp;
/// Tool dispatch layer - validated operations shared by all transports
pub mod tools;

#[cfg(test)]
pub mod test_utils;
