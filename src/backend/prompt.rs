//! Prompt and context assembly shared by every backend.

use crate::conversation::{Role, Turn};

/// Persona instruction sent ahead of every reply request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are Saachi, a compassionate, empathetic personal wellness assistant.
Your goal is to provide emotional support, listen actively, and help the user manage their well-being.
You use a warm, soothing tone. You are NOT a doctor or therapist.
If the user mentions self-harm, suicide, or a severe crisis, you MUST gently urge them to seek professional help immediately and provide standard helpline resources, then stop processing deeply.

You have access to \"Long Term Memories\" about the user. Use these to personalize your responses.
";

/// Most recent turns forwarded to the reply generator.
pub const HISTORY_WINDOW: usize = 10;

/// Turns the memory distiller reads; fewer than this yields no fact.
pub const MEMORY_WINDOW: usize = 4;

/// Substituted whenever a backend produces no usable reply text.
pub const FILLER_REPLY: &str = "I'm listening...";

/// Literal the distillation prompt asks for when nothing is worth keeping.
pub const NOTHING_SENTINEL: &str = "NOTHING";

/// Bullet list of long-term facts, or an empty string when there are none.
pub fn long_term_digest(facts: &[String]) -> String {
    if facts.is_empty() {
        return String::new();
    }
    let bullets = facts
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Here are some things I remember about you:\n{bullets}\n\n")
}

/// Persona instruction followed by the long-term digest.
pub fn system_context(facts: &[String]) -> String {
    format!("{SYSTEM_INSTRUCTION}\n{}", long_term_digest(facts))
}

/// The trailing [`HISTORY_WINDOW`] turns of `history`.
pub fn window(history: &[Turn]) -> &[Turn] {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    &history[start..]
}

/// Role label the hosted model expects: assistant turns are `model`, all
/// others are sent as `user`.
pub fn model_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User | Role::System => "user",
    }
}

/// The last [`MEMORY_WINDOW`] turns rendered as `role: text` lines.
pub fn transcript(turns: &[Turn]) -> String {
    let start = turns.len().saturating_sub(MEMORY_WINDOW);
    turns[start..]
        .iter()
        .map(|t| format!("{}: {}", t.role, t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn task_extraction_prompt(last_user: &str, last_reply: &str) -> String {
    format!(
        "Analyze the following conversation snippet. Did the user imply a task, goal, or habit they want to track? \
         Or did the assistant suggest a concrete step? If so, extract it as a task. If not, return an empty array.\
         \n\nUser: {last_user}\nAssistant: {last_reply}"
    )
}

pub fn distillation_prompt(turns: &[Turn]) -> String {
    format!(
        "Read this transcript. Extract ONE significant fact about the user's life, preferences, or emotional state \
         that would be useful to remember for the long term (LTM). If nothing significant is present, return \
         \"{NOTHING_SENTINEL}\".\n\n{}",
        transcript(turns)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_omitted_without_facts() {
        assert_eq!(long_term_digest(&[]), "");
        assert_eq!(system_context(&[]), format!("{SYSTEM_INSTRUCTION}\n"));
    }

    #[test]
    fn digest_lists_every_fact_in_order() {
        let facts = vec!["Enjoys yoga".to_string(), "Avoids gluten".to_string()];
        assert_eq!(
            long_term_digest(&facts),
            "Here are some things I remember about you:\n- Enjoys yoga\n- Avoids gluten\n\n"
        );
        assert!(system_context(&facts).starts_with(SYSTEM_INSTRUCTION));
    }

    #[test]
    fn window_keeps_the_last_ten_turns() {
        let history: Vec<Turn> = (0..13).map(|i| Turn::user(format!("m{i}"))).collect();
        let windowed = window(&history);
        assert_eq!(windowed.len(), HISTORY_WINDOW);
        assert_eq!(windowed[0].content, "m3");
        assert_eq!(windowed[9].content, "m12");
        assert_eq!(window(&history[..2]).len(), 2);
    }

    #[test]
    fn assistant_turns_map_to_model_role() {
        assert_eq!(model_role(Role::Assistant), "model");
        assert_eq!(model_role(Role::User), "user");
        assert_eq!(model_role(Role::System), "user");
    }

    #[test]
    fn transcript_renders_last_four_turns() {
        let turns = vec![
            Turn::user("zero"),
            Turn::assistant("one"),
            Turn::user("two"),
            Turn::assistant("three"),
            Turn::user("four"),
        ];
        assert_eq!(
            transcript(&turns),
            "assistant: one\nuser: two\nassistant: three\nuser: four"
        );
        assert!(distillation_prompt(&turns).ends_with("user: four"));
    }
}
