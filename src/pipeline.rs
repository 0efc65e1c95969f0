//! Per-turn orchestration of the three backend stages.
//!
//! [`Companion::respond`] runs one exchange against a [`Session`]: the reply
//! is awaited inline, then task extraction and (every fourth turn) memory
//! distillation are spawned onto the tokio runtime. Their results come back
//! as a [`PendingUpdates`] handle, which is the explicit join point:
//!
//! - `pending.join().await` then `session.apply(..)` before the next turn
//!   gives strictly ordered application;
//! - spawning the join elsewhere and applying whenever it resolves gives
//!   eventual, unordered application across turns. Both lists are
//!   append-only, so either order leaves the session consistent.
//!
//! Dropping a `PendingUpdates` detaches the background work and discards its
//! results. Nothing is retried and nothing times out.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::backend::prompt::MEMORY_WINDOW;
use crate::backend::CompanionBackend;
use crate::conversation::{BackgroundUpdates, Session, Task, Turn};
use crate::error::Result;

/// Outcome of one exchange: the reply plus background work still in flight.
pub struct Exchange {
    pub reply: String,
    pub pending: PendingUpdates,
}

/// Join handles for the background stages of one exchange.
pub struct PendingUpdates {
    tasks: JoinHandle<Vec<Task>>,
    fact: Option<JoinHandle<Option<String>>>,
}

impl PendingUpdates {
    /// Whether this exchange scheduled a memory distillation.
    pub fn distills(&self) -> bool {
        self.fact.is_some()
    }

    /// Wait for both background stages. A stage that panicked or was
    /// cancelled contributes nothing.
    pub async fn join(self) -> BackgroundUpdates {
        let tasks = self.tasks.await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "task extraction did not complete");
            Vec::new()
        });
        let fact = match self.fact {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "memory distillation did not complete");
                None
            }),
            None => None,
        };
        BackgroundUpdates { tasks, fact }
    }
}

/// The companion pipeline over an injected backend.
#[derive(Clone)]
pub struct Companion {
    backend: Arc<dyn CompanionBackend>,
}

impl Companion {
    pub fn new(backend: Arc<dyn CompanionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CompanionBackend> {
        &self.backend
    }

    /// Run one exchange against `session`.
    ///
    /// The user turn is recorded before the reply is requested. If the reply
    /// fails, the user turn stays and no assistant turn is added.
    pub async fn respond(&self, session: &mut Session, text: &str) -> Result<Exchange> {
        let history: Vec<Turn> = session.conversation.turns().to_vec();
        let length = session.conversation.push(Turn::user(text));
        session.remember_short_term(format!("User: {text}"));

        let long_term = session.long_term_facts();
        let reply = self.backend.generate_reply(&history, text, &long_term).await?;

        session.conversation.push(Turn::assistant(reply.clone()));
        session.remember_short_term(format!("Saachi: {reply}"));

        let tasks = {
            let companion = self.clone();
            let (user, assistant) = (text.to_string(), reply.clone());
            tokio::spawn(async move { companion.extract(&user, &assistant).await })
        };

        let fact = if length % MEMORY_WINDOW == 0 {
            let companion = self.clone();
            let mut snapshot = history;
            snapshot.push(session.conversation.turns()[length - 1].clone());
            Some(tokio::spawn(async move { companion.distill(&snapshot).await }))
        } else {
            None
        };

        tracing::debug!(
            backend = self.backend.name(),
            turns = session.conversation.len(),
            distilling = fact.is_some(),
            "exchange complete"
        );

        Ok(Exchange {
            reply,
            pending: PendingUpdates { tasks, fact },
        })
    }

    /// Reply generation without session bookkeeping. Backend errors propagate.
    pub async fn generate(
        &self,
        history: &[Turn],
        message: &str,
        long_term: &[String],
    ) -> Result<String> {
        self.backend.generate_reply(history, message, long_term).await
    }

    /// Task extraction that never fails: backend errors yield no tasks.
    pub async fn extract(&self, last_user: &str, last_reply: &str) -> Vec<Task> {
        match self.backend.extract_tasks(last_user, last_reply).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, backend = self.backend.name(), "task extraction failed");
                Vec::new()
            }
        }
    }

    /// Memory distillation that never fails: backend errors yield no fact.
    pub async fn distill(&self, recent: &[Turn]) -> Option<String> {
        if recent.len() < MEMORY_WINDOW {
            return None;
        }
        match self.backend.distill_memory(recent).await {
            Ok(fact) => fact,
            Err(e) => {
                tracing::warn!(error = %e, backend = self.backend.name(), "memory distillation failed");
                None
            }
        }
    }
}
