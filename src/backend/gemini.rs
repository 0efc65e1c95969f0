//! Hosted-model backend speaking the Gemini `generateContent` API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::{
    distillation_prompt, model_role, system_context, task_extraction_prompt, window,
    FILLER_REPLY, MEMORY_WINDOW, NOTHING_SENTINEL,
};
use super::CompanionBackend;
use crate::config::BackendConfig;
use crate::conversation::{Task, Turn};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, or `None` when the
    /// model populated no text at all.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let texts: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// One task as the model returns it under the extraction schema.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractedTask {
    title: String,
    #[serde(default)]
    due_date: Option<String>,
}

/// Thin HTTP client for `{api_base}/models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key().map(str::to_string),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Send one request and return whatever text the model produced.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Option<String>> {
        let api_key = self.api_key.as_deref().ok_or(PipelineError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        read_response(response).await
    }
}

/// Map a `generateContent` response to its text. Non-2xx statuses become
/// [`PipelineError::Api`] carrying the body.
pub async fn read_response(response: reqwest::Response) -> Result<Option<String>> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        return Err(PipelineError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)?;
    Ok(parsed.text())
}

pub struct GeminiBackend {
    client: GeminiClient,
    temperature: f32,
}

impl GeminiBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: GeminiClient::new(config),
            temperature: config.temperature,
        }
    }

    pub fn reply_request(
        &self,
        history: &[Turn],
        message: &str,
        long_term: &[String],
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = window(history)
            .iter()
            .map(|t| Content::text(Some(model_role(t.role)), t.content.clone()))
            .collect();
        contents.push(Content::text(Some("user"), message));

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::text(None, system_context(long_term))),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                ..Default::default()
            }),
        }
    }

    pub fn extraction_request(&self, last_user: &str, last_reply: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(
                Some("user"),
                task_extraction_prompt(last_user, last_reply),
            )],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_schema: Some(task_schema()),
                ..Default::default()
            }),
        }
    }

    pub fn distillation_request(&self, recent: &[Turn]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(Some("user"), distillation_prompt(recent))],
            system_instruction: None,
            generation_config: None,
        }
    }
}

/// Array of `{ title, dueDate? }` objects; `title` is required.
pub fn task_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "dueDate": { "type": "STRING" }
            },
            "required": ["title"]
        }
    })
}

/// Decode the extraction output. Anything that is not an array of tasks is
/// logged and treated as no tasks.
pub fn parse_tasks(raw: &str) -> Vec<Task> {
    let json = strip_code_fence(raw);
    match serde_json::from_str::<Vec<ExtractedTask>>(json) {
        Ok(items) => items
            .into_iter()
            .filter(|t| !t.title.trim().is_empty())
            .map(|t| Task::from_chat(t.title.trim(), t.due_date))
            .collect(),
        Err(e) => {
            tracing::error!(error = %e, raw = %raw, "failed to parse task extraction response");
            Vec::new()
        }
    }
}

/// Model text as a reply; blank or missing output becomes [`FILLER_REPLY`].
pub fn reply_text(raw: Option<String>) -> String {
    raw.filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| FILLER_REPLY.to_string())
}

/// Trimmed fact text, or `None` for blank output and the sentinel.
pub fn parse_fact(raw: Option<&str>) -> Option<String> {
    let text = raw.map(str::trim).unwrap_or_default();
    if text.is_empty() || text == NOTHING_SENTINEL {
        None
    } else {
        Some(text.to_string())
    }
}

/// Models sometimes wrap JSON in a markdown fence despite the mime type.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl CompanionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_reply(
        &self,
        history: &[Turn],
        message: &str,
        long_term: &[String],
    ) -> Result<String> {
        let request = self.reply_request(history, message, long_term);
        let text = self.client.generate_content(&request).await?;
        Ok(reply_text(text))
    }

    async fn extract_tasks(&self, last_user: &str, last_reply: &str) -> Result<Vec<Task>> {
        let request = self.extraction_request(last_user, last_reply);
        let raw = self.client.generate_content(&request).await?;
        Ok(parse_tasks(raw.as_deref().unwrap_or("[]")))
    }

    async fn distill_memory(&self, recent: &[Turn]) -> Result<Option<String>> {
        if recent.len() < MEMORY_WINDOW {
            return Ok(None);
        }
        let request = self.distillation_request(recent);
        let raw = self.client.generate_content(&request).await?;
        Ok(parse_fact(raw.as_deref()))
    }
}
