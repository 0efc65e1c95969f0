//! `POST /api/saachi`: one route, three actions.
//!
//! Body: `{ "action": "reply" | "extract" | "memorize", "payload": { ... } }`.
//! Missing payload fields default to empty values. Unknown actions are a
//! 400; backend failures are logged and answered with a generic 500.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{decode_json, ApiError, AppState};
use crate::conversation::{Role, Turn};
use crate::pipeline::Companion;

#[derive(Debug, Deserialize)]
struct ActionRequest {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

/// A turn as clients send it; extra fields such as ids are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnPayload {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl From<TurnPayload> for Turn {
    fn from(p: TurnPayload) -> Self {
        Turn::new(p.role, p.content)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplyPayload {
    pub history: Vec<TurnPayload>,
    pub message: String,
    pub ltm: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractPayload {
    pub last_user_message: String,
    pub last_ai_response: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemorizePayload {
    pub conversation: Vec<TurnPayload>,
}

pub async fn handle_action(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    dispatch(&state.companion, &body).await.map(Json)
}

/// Decode and run one action request.
pub async fn dispatch(companion: &Companion, body: &[u8]) -> Result<Value, ApiError> {
    let request: ActionRequest = decode_json(body)?;
    let payload = request.payload.unwrap_or(Value::Null);
    let backend = companion.backend();

    match request.action.as_deref() {
        Some("reply") => {
            let p: ReplyPayload = decode_payload(payload)?;
            let history: Vec<Turn> = p.history.into_iter().map(Turn::from).collect();
            let reply = backend
                .generate_reply(&history, &p.message, &p.ltm)
                .await
                .map_err(|e| server_error("reply", e))?;
            Ok(json!({ "reply": reply }))
        }
        Some("extract") => {
            let p: ExtractPayload = decode_payload(payload)?;
            let tasks = backend
                .extract_tasks(&p.last_user_message, &p.last_ai_response)
                .await
                .map_err(|e| server_error("extract", e))?;
            Ok(json!({ "tasks": tasks }))
        }
        Some("memorize") => {
            let p: MemorizePayload = decode_payload(payload)?;
            let conversation: Vec<Turn> = p.conversation.into_iter().map(Turn::from).collect();
            let fact = backend
                .distill_memory(&conversation)
                .await
                .map_err(|e| server_error("memorize", e))?;
            Ok(json!({ "fact": fact }))
        }
        _ => Err(ApiError::BadRequest("Unknown action".into())),
    }
}

fn decode_payload<T: for<'de> Deserialize<'de> + Default>(payload: Value) -> Result<T, ApiError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload)
        .map_err(|e| ApiError::BadRequest(format!("invalid payload: {e}")))
}

fn server_error(action: &str, err: crate::error::PipelineError) -> ApiError {
    tracing::error!(action, error = %err, "/api/saachi request failed");
    ApiError::Internal
}
