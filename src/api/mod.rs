//! HTTP surface: the stateless action route plus in-memory session routes.
//!
//! [`router`] builds the axum [`Router`]; the MCP service is mounted next to
//! it by [`crate::server::serve_http`].

pub mod actions;
pub mod sessions;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::pipeline::Companion;
use sessions::SessionRegistry;

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub companion: Companion,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(companion: Companion) -> Self {
        Self {
            companion,
            sessions: SessionRegistry::default(),
        }
    }
}

/// Errors a route can answer with. Bodies are always `{ "error": "..." }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Details are logged, never sent to the client.
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg,
            Self::Internal => "Server error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message(),
        });
        (self.status(), body).into_response()
    }
}

/// Decode a JSON request body. Malformed input is a 400 with the usual
/// `{ "error": "..." }` body rather than axum's plain-text rejection.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: String,
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.companion.backend().name().to_string(),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/saachi", post(actions::handle_action))
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/{id}/messages", post(sessions::send_message))
        .route("/sessions/{id}/moods", post(sessions::log_mood))
        .route("/sessions/{id}/tasks", post(sessions::add_task))
        .route(
            "/sessions/{id}/tasks/{task_id}/toggle",
            post(sessions::toggle_task),
        )
        .route("/sessions/{id}/short-term", delete(sessions::clear_short_term))
        .with_state(state)
}
