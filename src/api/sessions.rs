//! In-memory session routes: chat, moods, tasks, short-term context.
//!
//! Each session sits behind its own mutex so a slow reply for one user does
//! not block another. Background extraction/distillation results are applied
//! whenever they resolve, in whatever order the backend answers.
//!
//! Sessions live until `DELETE /sessions/{id}`. There is no expiry, so a
//! client that never deletes its sessions grows the registry without bound.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::{decode_json, ApiError, AppState};
use crate::conversation::{MoodEntry, Session, Task, TaskStatus};
use crate::pipeline::{Companion, Exchange};

type SharedSession = Arc<Mutex<Session>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
}

impl SessionRegistry {
    /// Open a new session seeded with the greeting and return a snapshot.
    pub async fn create(&self) -> Session {
        let session = Session::with_greeting();
        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), Arc::new(Mutex::new(session)));
        tracing::info!(session = %snapshot.id, "session created");
        snapshot
    }

    pub async fn get(&self, id: &str) -> Result<SharedSession, ApiError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("no session {id}")))
    }

    pub async fn snapshot(&self, id: &str) -> Result<Session, ApiError> {
        let session = self.get(id).await?;
        let guard = session.lock().await;
        Ok(guard.clone())
    }

    /// Drop a session. Background work still in flight for it is discarded
    /// with the session.
    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        if self.sessions.write().await.remove(id).is_none() {
            return Err(ApiError::NotFound(format!("no session {id}")));
        }
        tracing::info!(session = %id, "session removed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run one exchange. The reply is returned as soon as it is ready; the
    /// background updates are applied to the session by a detached task.
    pub async fn send_message(
        &self,
        companion: &Companion,
        id: &str,
        content: &str,
    ) -> Result<String, ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::BadRequest("message content must not be empty".into()));
        }
        let session = self.get(id).await?;
        let Exchange { reply, pending } = {
            let mut guard = session.lock().await;
            companion.respond(&mut guard, content).await.map_err(|e| {
                tracing::error!(session = %id, error = %e, "reply generation failed");
                ApiError::Internal
            })?
        };

        let session_id = id.to_string();
        tokio::spawn(async move {
            let updates = pending.join().await;
            if updates.is_empty() {
                return;
            }
            tracing::debug!(
                session = %session_id,
                tasks = updates.tasks.len(),
                fact = updates.fact.is_some(),
                "applying background updates"
            );
            session.lock().await.apply(updates);
        });

        Ok(reply)
    }

    pub async fn log_mood(
        &self,
        id: &str,
        score: u8,
        note: Option<String>,
    ) -> Result<MoodEntry, ApiError> {
        let session = self.get(id).await?;
        let mut guard = session.lock().await;
        guard
            .log_mood(score, note)
            .cloned()
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }

    pub async fn add_task(
        &self,
        id: &str,
        title: &str,
        due_date: Option<String>,
    ) -> Result<Task, ApiError> {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("task title must not be empty".into()));
        }
        let session = self.get(id).await?;
        let mut guard = session.lock().await;
        Ok(guard.add_manual_task(title.trim(), due_date).clone())
    }

    pub async fn toggle_task(&self, id: &str, task_id: &str) -> Result<TaskStatus, ApiError> {
        let session = self.get(id).await?;
        let mut guard = session.lock().await;
        guard
            .toggle_task(task_id)
            .ok_or_else(|| ApiError::NotFound(format!("no task {task_id}")))
    }

    pub async fn clear_short_term(&self, id: &str) -> Result<(), ApiError> {
        let session = self.get(id).await?;
        session.lock().await.clear_short_term();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct LogMoodRequest {
    pub score: u8,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskRequest {
    pub title: String,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleTaskResponse {
    pub status: TaskStatus,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub cleared: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

pub async fn create_session(State(state): State<AppState>) -> Json<Session> {
    Json(state.sessions.create().await)
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    state.sessions.snapshot(&id).await.map(Json)
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.sessions.remove(&id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let req: SendMessageRequest = decode_json(&body)?;
    let reply = state
        .sessions
        .send_message(&state.companion, &id, &req.content)
        .await?;
    Ok(Json(SendMessageResponse { reply }))
}

pub async fn log_mood(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<MoodEntry>, ApiError> {
    let req: LogMoodRequest = decode_json(&body)?;
    state
        .sessions
        .log_mood(&id, req.score, req.note)
        .await
        .map(Json)
}

pub async fn add_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, ApiError> {
    let req: AddTaskRequest = decode_json(&body)?;
    state
        .sessions
        .add_task(&id, &req.title, req.due_date)
        .await
        .map(Json)
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(String, String)>,
) -> Result<Json<ToggleTaskResponse>, ApiError> {
    let status = state.sessions.toggle_task(&id, &task_id).await?;
    Ok(Json(ToggleTaskResponse { status }))
}

pub async fn clear_short_term(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClearedResponse>, ApiError> {
    state.sessions.clear_short_term(&id).await?;
    Ok(Json(ClearedResponse { cleared: true }))
}
