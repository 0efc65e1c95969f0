//! Conversation turn as it appears in MCP tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conversation::{Role, Turn};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TurnParam {
    #[schemars(description = "Who wrote the turn: 'user', 'assistant' or 'system'")]
    pub role: String,

    #[schemars(description = "Text of the turn")]
    pub content: String,
}

/// Convert parameter turns, rejecting unknown roles.
pub fn to_turns(params: Vec<TurnParam>) -> Result<Vec<Turn>, String> {
    params
        .into_iter()
        .map(|p| {
            let role: Role = p.role.parse()?;
            Ok(Turn::new(role, p.content))
        })
        .collect()
}
