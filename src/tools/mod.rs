pub mod distill_memory;
pub mod extract_tasks;
pub mod generate_reply;
pub mod turn;

use distill_memory::DistillMemoryParams;
use extract_tasks::ExtractTasksParams;
use generate_reply::GenerateReplyParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use crate::pipeline::Companion;

/// The Saachi MCP tool handler. Holds the companion pipeline and exposes the
/// three pipeline stages as MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct SaachiTools {
    tool_router: ToolRouter<Self>,
    companion: Companion,
}

#[tool_router]
impl SaachiTools {
    pub fn new(companion: Companion) -> Self {
        Self {
            tool_router: Self::tool_router(),
            companion,
        }
    }

    /// Generate Saachi's next reply.
    #[tool(description = "Generate Saachi's supportive reply to a new user message, given prior turns and long-term facts about the user.")]
    async fn generate_reply(
        &self,
        Parameters(params): Parameters<GenerateReplyParams>,
    ) -> Result<String, String> {
        let history = turn::to_turns(params.history.unwrap_or_default())?;
        let long_term = params.long_term.unwrap_or_default();

        tracing::info!(
            history = history.len(),
            long_term = long_term.len(),
            "generate_reply called"
        );

        let reply = self
            .companion
            .generate(&history, &params.message, &long_term)
            .await
            .map_err(|e| format!("reply failed: {e}"))?;

        serde_json::to_string(&serde_json::json!({ "reply": reply }))
            .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Extract tasks implied by the last exchange.
    #[tool(description = "Extract actionable wellness tasks (habits, goals, concrete steps) from the last user message and assistant reply. Returns an empty list when none are implied.")]
    async fn extract_tasks(
        &self,
        Parameters(params): Parameters<ExtractTasksParams>,
    ) -> Result<String, String> {
        let reply = params.last_ai_response.unwrap_or_default();
        let tasks = self
            .companion
            .extract(&params.last_user_message, &reply)
            .await;

        tracing::info!(tasks = tasks.len(), "extract_tasks called");

        serde_json::to_string(&serde_json::json!({ "tasks": tasks }))
            .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Distill one long-term fact from recent turns.
    #[tool(description = "Distill at most one durable fact about the user from the last four conversation turns. Returns null when nothing is worth remembering.")]
    async fn distill_memory(
        &self,
        Parameters(params): Parameters<DistillMemoryParams>,
    ) -> Result<String, String> {
        let conversation = turn::to_turns(params.conversation)?;
        let fact = self.companion.distill(&conversation).await;

        tracing::info!(
            turns = conversation.len(),
            found = fact.is_some(),
            "distill_memory called"
        );

        serde_json::to_string(&serde_json::json!({ "fact": fact }))
            .map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for SaachiTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Saachi is a wellness companion. Use generate_reply for the next supportive \
                 message, extract_tasks after each exchange, and distill_memory every few \
                 turns to collect long-term facts."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
