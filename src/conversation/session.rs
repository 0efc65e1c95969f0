//! Explicit per-session context threaded through every pipeline call.
//!
//! A [`Session`] owns everything a single user's conversation accumulates:
//! the turn history, short- and long-term memory, tasks and mood entries.
//! Nothing here is persisted; the caller decides how long a session lives.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::conversation::store::ConversationStore;
use crate::conversation::types::{
    MemoryItem, MemoryKind, MoodEntry, Task, TaskStatus, Turn, MAX_MOOD_SCORE, MIN_MOOD_SCORE,
};

pub const GREETING: &str = "Hello. I'm Saachi. I'm here to listen, support, and help you find balance. How are you feeling today?";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoodError {
    #[error("mood score must be between 1 and 5, got {0}")]
    OutOfRange(u8),
}

/// Results of the background stages of one exchange, ready to be merged
/// into the session that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundUpdates {
    pub tasks: Vec<Task>,
    pub fact: Option<String>,
}

impl BackgroundUpdates {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.fact.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub conversation: ConversationStore,
    pub short_term: Vec<MemoryItem>,
    pub long_term: Vec<MemoryItem>,
    pub tasks: Vec<Task>,
    pub moods: Vec<MoodEntry>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            conversation: ConversationStore::new(),
            short_term: Vec::new(),
            long_term: Vec::new(),
            tasks: Vec::new(),
            moods: Vec::new(),
        }
    }

    /// A session opened with Saachi's greeting as the first turn.
    pub fn with_greeting() -> Self {
        let mut session = Self::new();
        session.conversation.push(Turn::assistant(GREETING));
        session
    }

    /// Long-term fact texts, oldest first.
    pub fn long_term_facts(&self) -> Vec<String> {
        self.long_term.iter().map(|m| m.content.clone()).collect()
    }

    pub fn remember_short_term(&mut self, content: impl Into<String>) {
        self.short_term
            .push(MemoryItem::new(MemoryKind::ShortTerm, content));
    }

    pub fn remember_long_term(&mut self, content: impl Into<String>) {
        self.long_term
            .push(MemoryItem::new(MemoryKind::LongTerm, content));
    }

    /// Drop the short-term context. Long-term facts are kept.
    pub fn clear_short_term(&mut self) {
        self.short_term.clear();
    }

    pub fn add_tasks(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.extend(tasks);
    }

    pub fn add_manual_task(&mut self, title: impl Into<String>, due_date: Option<String>) -> &Task {
        self.tasks.push(Task::manual(title, due_date));
        &self.tasks[self.tasks.len() - 1]
    }

    /// Flip a task between pending and completed. Returns the new status, or
    /// `None` if no task has that id.
    pub fn toggle_task(&mut self, id: &str) -> Option<TaskStatus> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.status = task.status.toggled();
        Some(task.status)
    }

    pub fn log_mood(&mut self, score: u8, note: Option<String>) -> Result<&MoodEntry, MoodError> {
        if !(MIN_MOOD_SCORE..=MAX_MOOD_SCORE).contains(&score) {
            return Err(MoodError::OutOfRange(score));
        }
        self.moods.push(MoodEntry {
            timestamp: Utc::now(),
            score,
            note,
        });
        Ok(&self.moods[self.moods.len() - 1])
    }

    /// Merge the results of a background extraction/distillation.
    pub fn apply(&mut self, updates: BackgroundUpdates) {
        self.add_tasks(updates.tasks);
        if let Some(fact) = updates.fact {
            self.remember_long_term(fact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::types::{Role, TaskOrigin};

    #[test]
    fn greeting_session_starts_with_assistant_turn() {
        let session = Session::with_greeting();
        assert_eq!(session.conversation.len(), 1);
        let first = &session.conversation.turns()[0];
        assert_eq!(first.role, Role::Assistant);
        assert_eq!(first.content, GREETING);
        assert!(Session::new().conversation.is_empty());
    }

    #[test]
    fn mood_scores_outside_range_are_rejected() {
        let mut session = Session::new();
        assert_eq!(session.log_mood(0, None), Err(MoodError::OutOfRange(0)));
        assert_eq!(session.log_mood(6, None), Err(MoodError::OutOfRange(6)));
        assert!(session.moods.is_empty());

        let entry = session.log_mood(4, Some("better".into())).unwrap();
        assert_eq!(entry.score, 4);
        assert_eq!(session.moods.len(), 1);
    }

    #[test]
    fn toggle_flips_only_the_named_task() {
        let mut session = Session::new();
        let id = session.add_manual_task("Walk in the park", None).id.clone();
        session.add_manual_task("Drink 2L of water", None);

        assert_eq!(session.toggle_task(&id), Some(TaskStatus::Completed));
        assert_eq!(session.tasks[1].status, TaskStatus::Pending);
        assert_eq!(session.toggle_task(&id), Some(TaskStatus::Pending));
        assert_eq!(session.toggle_task("missing"), None);
        assert_eq!(session.tasks[0].origin, TaskOrigin::Manual);
    }

    #[test]
    fn apply_appends_tasks_and_fact() {
        let mut session = Session::new();
        session.remember_long_term("Enjoys yoga");
        session.apply(BackgroundUpdates {
            tasks: vec![Task::from_chat("Take a 20-minute walk", None)],
            fact: Some("Prefers morning sessions".into()),
        });
        assert_eq!(session.tasks.len(), 1);
        assert_eq!(
            session.long_term_facts(),
            vec!["Enjoys yoga".to_string(), "Prefers morning sessions".to_string()]
        );
    }

    #[test]
    fn clearing_short_term_keeps_long_term() {
        let mut session = Session::new();
        session.remember_short_term("User: hi");
        session.remember_long_term("Avoids gluten");
        session.clear_short_term();
        assert!(session.short_term.is_empty());
        assert_eq!(session.long_term.len(), 1);
    }
}
