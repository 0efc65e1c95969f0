use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::turn::TurnParam;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DistillMemoryParams {
    #[schemars(
        description = "Recent conversation turns, oldest first. Only the last four are read; fewer than four yields no fact."
    )]
    pub conversation: Vec<TurnParam>,
}
