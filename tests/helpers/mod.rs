#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use saachi::backend::heuristic::HeuristicBackend;
use saachi::backend::CompanionBackend;
use saachi::conversation::{Task, Turn};
use saachi::error::{PipelineError, Result};
use saachi::pipeline::Companion;

/// A companion over the deterministic offline backend.
pub fn heuristic_companion() -> Companion {
    Companion::new(Arc::new(HeuristicBackend::new()))
}

/// Alternating user/assistant turns, starting with the user.
pub fn turns(contents: &[&str]) -> Vec<Turn> {
    contents
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i % 2 == 0 {
                Turn::user(*c)
            } else {
                Turn::assistant(*c)
            }
        })
        .collect()
}

/// A backend whose every call fails as if the provider returned a 503.
/// Counts calls so tests can check what was attempted.
#[derive(Default)]
pub struct FailingBackend {
    pub calls: AtomicUsize,
}

impl FailingBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PipelineError::Api {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

#[async_trait]
impl CompanionBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate_reply(&self, _: &[Turn], _: &str, _: &[String]) -> Result<String> {
        self.fail()
    }

    async fn extract_tasks(&self, _: &str, _: &str) -> Result<Vec<Task>> {
        self.fail()
    }

    async fn distill_memory(&self, _: &[Turn]) -> Result<Option<String>> {
        self.fail()
    }
}

/// Replies succeed; the background stages fail.
#[derive(Default)]
pub struct FlakyBackend;

#[async_trait]
impl CompanionBackend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn generate_reply(&self, _: &[Turn], message: &str, _: &[String]) -> Result<String> {
        Ok(format!("echo: {message}"))
    }

    async fn extract_tasks(&self, _: &str, _: &str) -> Result<Vec<Task>> {
        Err(PipelineError::MissingApiKey)
    }

    async fn distill_memory(&self, _: &[Turn]) -> Result<Option<String>> {
        Err(PipelineError::MissingApiKey)
    }
}

pub fn failing_companion() -> (Companion, Arc<FailingBackend>) {
    let backend = Arc::new(FailingBackend::default());
    (Companion::new(backend.clone()), backend)
}

pub fn flaky_companion() -> Companion {
    Companion::new(Arc::new(FlakyBackend))
}

pub fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}
