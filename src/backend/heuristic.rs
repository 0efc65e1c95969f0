//! Deterministic, network-free backend.
//!
//! Replies come from keyword matching and a small canned list; tasks and
//! memories come from fixed ordered regex tables. Every operation is a pure
//! function of its inputs (apart from generated task ids), which makes this
//! backend the one tests run against.

use async_trait::async_trait;
use regex::{Captures, Regex};

use super::prompt::MEMORY_WINDOW;
use super::CompanionBackend;
use crate::conversation::{Task, Turn};
use crate::error::Result;

pub const ANXIETY_REPLY: &str = "I'm sorry you're feeling anxious — let's try a simple 4-4-4 breathing exercise together. Breathe in 4, hold 4, breathe out 4. Want to try?";
pub const SADNESS_REPLY: &str = "I can hear how heavy this feels. Would it help to talk about what started this feeling, or would you like a small grounding prompt?";
pub const SLEEP_REPLY: &str = "Sleep is so important. Would you like a short sleep-friendly breathing routine or a gentle sleep tip?";

pub const CANNED_REPLIES: [&str; 4] = [
    "I'm here with you — tell me more about how you're feeling.",
    "Thanks for sharing. That sounds really important. Would you like a short breathing exercise now?",
    "I hear you. It's okay to feel that way — want to try a grounding exercise together?",
    "You're not alone. Can you tell me which part of this feels hardest right now?",
];

/// Checked in order; the first theme with a matching keyword wins.
const THEMES: [(&[&str], &str); 3] = [
    (&["anx", "nerv", "panic"], ANXIETY_REPLY),
    (&["sad", "depress", "down"], SADNESS_REPLY),
    (&["sleep", "insomnia", "tired"], SLEEP_REPLY),
];

type FactFormatter = fn(&Captures<'_>) -> String;

pub struct HeuristicBackend {
    task_patterns: Vec<(Regex, &'static str)>,
    fact_patterns: Vec<(Regex, FactFormatter)>,
    preference_fallback: Regex,
}

impl Default for HeuristicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicBackend {
    pub fn new() -> Self {
        let task_patterns = vec![
            (pattern(r"(?i)(meditat|meditation|breath)"), "Try a 5-minute meditation"),
            (pattern(r"(?i)(drink|water|2l|2 liters)"), "Drink 2L of water today"),
            (pattern(r"(?i)(journal|write.*gratitude|gratitude)"), "Write a short gratitude journal"),
            (pattern(r"(?i)(walk|go for a walk|take a walk)"), "Take a 20-minute walk"),
        ];

        let fact_patterns = vec![
            (
                pattern(r"(?i)(prefer|likes?) (morning|evening|night)"),
                prefers_session as FactFormatter,
            ),
            (
                pattern(r"(?i)(enjoy|likes?) (nature|walks|yoga|meditation)"),
                enjoys as FactFormatter,
            ),
            (
                pattern(r"(?i)(allergic to|can't eat|avoids) (\w+)"),
                avoids as FactFormatter,
            ),
        ];

        Self {
            task_patterns,
            fact_patterns,
            preference_fallback: pattern(r"(?i)i (prefer|like|love) ([a-z\s]+)"),
        }
    }

    /// Keyword reply, or a canned reply suffixed with the newest long-term
    /// fact. Keyword replies are returned verbatim.
    pub fn reply(&self, message: &str, long_term: &[String]) -> String {
        let lowered = message.to_lowercase();
        if let Some((_, reply)) = THEMES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        {
            return reply.to_string();
        }

        // Length in UTF-16 code units, as the web client counts it.
        let index = message.encode_utf16().count() % CANNED_REPLIES.len();
        let mut reply = CANNED_REPLIES[index].to_string();
        if let Some(latest) = long_term.last() {
            reply.push_str(&format!(" I remember: {latest}."));
        }
        reply
    }

    /// One task per matching pattern, in table order.
    pub fn tasks(&self, last_user: &str, last_reply: &str) -> Vec<Task> {
        let text = format!("{last_user} {last_reply}").to_lowercase();
        self.task_patterns
            .iter()
            .filter(|(re, _)| re.is_match(&text))
            .map(|(_, title)| Task::from_chat(*title, None))
            .collect()
    }

    /// First matching preference/avoidance pattern over the last four turns.
    pub fn fact(&self, recent: &[Turn]) -> Option<String> {
        if recent.len() < MEMORY_WINDOW {
            return None;
        }
        let start = recent.len() - MEMORY_WINDOW;
        let text = recent[start..]
            .iter()
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
            .to_lowercase();

        for (re, format) in &self.fact_patterns {
            if let Some(caps) = re.captures(&text) {
                return Some(format(&caps));
            }
        }

        let caps = self.preference_fallback.captures(&text)?;
        let preference = caps[2].trim();
        (!preference.is_empty()).then(|| format!("Prefers {preference}"))
    }
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid heuristic pattern")
}

fn prefers_session(caps: &Captures<'_>) -> String {
    format!("Prefers {} sessions", &caps[2])
}

fn enjoys(caps: &Captures<'_>) -> String {
    format!("Enjoys {}", &caps[2])
}

fn avoids(caps: &Captures<'_>) -> String {
    format!("Avoids {}", &caps[2])
}

#[async_trait]
impl CompanionBackend for HeuristicBackend {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn generate_reply(
        &self,
        _history: &[Turn],
        message: &str,
        long_term: &[String],
    ) -> Result<String> {
        Ok(self.reply(message, long_term))
    }

    async fn extract_tasks(&self, last_user: &str, last_reply: &str) -> Result<Vec<Task>> {
        Ok(self.tasks(last_user, last_reply))
    }

    async fn distill_memory(&self, recent: &[Turn]) -> Result<Option<String>> {
        Ok(self.fact(recent))
    }
}
