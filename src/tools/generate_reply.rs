use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::turn::TurnParam;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GenerateReplyParams {
    #[schemars(description = "The user's new message")]
    pub message: String,

    #[schemars(description = "Prior conversation turns, oldest first, not including the new message")]
    pub history: Option<Vec<TurnParam>>,

    #[schemars(description = "Long-term facts about the user, oldest first")]
    pub long_term: Option<Vec<String>>,
}
