//! Saachi, a wellness companion service.
//!
//! Saachi answers a user's chat messages, proposes small wellness tasks from
//! each exchange, and every few turns distills one long-term fact about the
//! user that is fed back into later replies. Each stage is one round-trip to
//! a [`backend::CompanionBackend`]:
//!
//! | Stage | Input | Output | Failure mode |
//! |-------|-------|--------|--------------|
//! | **Reply** | last 10 turns, new message, long-term facts | reply text | error (caller decides) |
//! | **Tasks** | last user message + reply | `0..n` tasks | empty list |
//! | **Memory** | last 4 turns | at most one fact | none |
//!
//! Two backends are available: a hosted Gemini model and a deterministic
//! keyword/regex heuristic that needs no network.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`conversation`]: Turns, memory items, tasks, moods and the per-session context
//! - [`backend`]: The backend trait, prompt assembly, Gemini and heuristic implementations
//! - [`pipeline`]: Per-turn orchestration with an explicit join point for background work
//! - [`api`]: HTTP routes (axum)
//! - [`tools`]: MCP tools (rmcp)
//! - [`server`]: stdio and HTTP transports

pub mod api;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod tools;
