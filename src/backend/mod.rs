//! Language-model backends for the three pipeline stages.
//!
//! Provides the [`CompanionBackend`] trait with two interchangeable
//! implementations: [`gemini::GeminiBackend`] (hosted model) and
//! [`heuristic::HeuristicBackend`] (deterministic keyword/regex rules). The
//! backend is created via [`create_backend`] from configuration.

pub mod gemini;
pub mod heuristic;
pub mod prompt;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::BackendConfig;
use crate::conversation::{Task, Turn};

/// The three round-trips the companion makes per exchange.
///
/// Implementations must not fail on malformed model output: unusable reply
/// text becomes [`prompt::FILLER_REPLY`], unparseable task lists become empty
/// and unusable facts become `None`. Errors are reserved for transport
/// failures.
#[async_trait]
pub trait CompanionBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Next assistant utterance for `message`, given prior `history` (oldest
    /// first, not including `message`) and long-term facts (oldest first).
    async fn generate_reply(
        &self,
        history: &[Turn],
        message: &str,
        long_term: &[String],
    ) -> crate::error::Result<String>;

    /// Zero or more tasks implied by the latest exchange.
    async fn extract_tasks(
        &self,
        last_user: &str,
        last_reply: &str,
    ) -> crate::error::Result<Vec<Task>>;

    /// At most one durable fact from the last four turns of `recent`.
    async fn distill_memory(&self, recent: &[Turn]) -> crate::error::Result<Option<String>>;
}

/// Create a backend from config.
///
/// `"gemini"` builds the hosted-model backend even without an API key: the
/// missing key is logged here and surfaces on every request instead.
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn CompanionBackend>> {
    match config.provider.as_str() {
        "gemini" => {
            if config.api_key().is_none() {
                tracing::warn!("GOOGLE_API_KEY is not set; requests will fail until it is provided");
            }
            Ok(Box::new(gemini::GeminiBackend::new(config)))
        }
        "heuristic" => Ok(Box::new(heuristic::HeuristicBackend::new())),
        other => anyhow::bail!("unknown backend provider: {other}. Supported: gemini, heuristic"),
    }
}
