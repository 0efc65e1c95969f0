use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExtractTasksParams {
    #[schemars(description = "The last message the user sent")]
    pub last_user_message: String,

    #[schemars(description = "The assistant's reply to that message")]
    pub last_ai_response: Option<String>,
}
