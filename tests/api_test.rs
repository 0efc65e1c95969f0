mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use helpers::{failing_companion, heuristic_companion};
use saachi::api::actions::dispatch;
use saachi::api::sessions::SessionRegistry;
use saachi::api::ApiError;
use saachi::backend::heuristic::{ANXIETY_REPLY, CANNED_REPLIES};
use saachi::conversation::{TaskOrigin, TaskStatus};
use serde_json::json;

async fn call(body: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let companion = heuristic_companion();
    dispatch(&companion, body.to_string().as_bytes()).await
}

#[tokio::test]
async fn reply_action_uses_long_term_facts() {
    let out = call(json!({
        "action": "reply",
        "payload": {
            "history": [{ "id": "1", "role": "user", "content": "hi" }],
            "message": "hello",
            "ltm": ["Enjoys yoga"]
        }
    }))
    .await
    .unwrap();
    assert_eq!(out["reply"], format!("{} I remember: Enjoys yoga.", CANNED_REPLIES[1]));

    let out = call(json!({
        "action": "reply",
        "payload": { "message": "I feel anxious", "ltm": ["Enjoys yoga"] }
    }))
    .await
    .unwrap();
    assert_eq!(out["reply"], ANXIETY_REPLY);
}

#[tokio::test]
async fn missing_payload_fields_default_to_empty() {
    let out = call(json!({ "action": "reply" })).await.unwrap();
    assert_eq!(out["reply"], CANNED_REPLIES[0]);

    let out = call(json!({ "action": "extract", "payload": {} })).await.unwrap();
    assert_eq!(out["tasks"], json!([]));
}

#[tokio::test]
async fn extract_action_returns_wire_shaped_tasks() {
    let out = call(json!({
        "action": "extract",
        "payload": { "lastUserMessage": "I drank water", "lastAiResponse": "" }
    }))
    .await
    .unwrap();
    let tasks = out["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Drink 2L of water today");
    assert_eq!(tasks[0]["status"], "pending");
    assert_eq!(tasks[0]["origin"], "chat");
    assert!(tasks[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn memorize_action_needs_four_turns() {
    let short = call(json!({
        "action": "memorize",
        "payload": { "conversation": [
            { "role": "user", "content": "I prefer evening yoga" },
            { "role": "assistant", "content": "Noted" }
        ]}
    }))
    .await
    .unwrap();
    assert!(short["fact"].is_null());

    let full = call(json!({
        "action": "memorize",
        "payload": { "conversation": [
            { "role": "user", "content": "I prefer evening yoga" },
            { "role": "assistant", "content": "Noted" },
            { "role": "user", "content": "thanks" },
            { "role": "assistant", "content": "Any time" }
        ]}
    }))
    .await
    .unwrap();
    assert_eq!(full["fact"], "Prefers evening sessions");
}

#[tokio::test]
async fn unknown_or_missing_action_is_rejected() {
    for body in [json!({ "action": "dance" }), json!({ "payload": {} })] {
        let err = call(body).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Unknown action");
    }
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let companion = heuristic_companion();
    let err = dispatch(&companion, b"{not json").await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = call(json!({
        "action": "reply",
        "payload": { "history": [{ "role": "moderator", "content": "x" }] }
    }))
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backend_failures_are_generic_server_errors() {
    let (companion, _) = failing_companion();
    for action in ["reply", "extract", "memorize"] {
        let body = json!({ "action": action, "payload": { "conversation": [
            { "role": "user", "content": "a" },
            { "role": "assistant", "content": "b" },
            { "role": "user", "content": "c" },
            { "role": "assistant", "content": "d" }
        ]}});
        let err = dispatch(&companion, body.to_string().as_bytes())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR, "action: {action}");
        assert_eq!(err.message(), "Server error");
    }
}

#[tokio::test]
async fn session_message_applies_background_updates() {
    let companion = heuristic_companion();
    let registry = SessionRegistry::default();
    let session = registry.create().await;
    assert_eq!(session.conversation.len(), 1);
    assert_eq!(registry.len().await, 1);

    let reply = registry
        .send_message(&companion, &session.id, "I went for a walk")
        .await
        .unwrap();
    assert!(!reply.is_empty());

    let mut snapshot = registry.snapshot(&session.id).await.unwrap();
    for _ in 0..50 {
        if !snapshot.tasks.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        snapshot = registry.snapshot(&session.id).await.unwrap();
    }
    assert_eq!(snapshot.conversation.len(), 3);
    assert!(snapshot.tasks.iter().any(|t| t.title == "Take a 20-minute walk"));
}

#[tokio::test]
async fn session_message_validation() {
    let companion = heuristic_companion();
    let registry = SessionRegistry::default();
    let session = registry.create().await;

    let err = registry
        .send_message(&companion, &session.id, "   ")
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = registry
        .send_message(&companion, "no-such-session", "hello")
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_reply_keeps_user_turn_in_session() {
    let (companion, _) = failing_companion();
    let registry = SessionRegistry::default();
    let session = registry.create().await;

    let err = registry
        .send_message(&companion, &session.id, "hello")
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let snapshot = registry.snapshot(&session.id).await.unwrap();
    assert_eq!(snapshot.conversation.len(), 2);
}

#[tokio::test]
async fn moods_are_range_checked() {
    let registry = SessionRegistry::default();
    let session = registry.create().await;

    let err = registry.log_mood(&session.id, 0, None).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.message(), "mood score must be between 1 and 5, got 0");
    assert!(registry.log_mood(&session.id, 6, None).await.is_err());

    let entry = registry
        .log_mood(&session.id, 4, Some("better".into()))
        .await
        .unwrap();
    assert_eq!(entry.score, 4);

    let snapshot = registry.snapshot(&session.id).await.unwrap();
    assert_eq!(snapshot.moods.len(), 1);
}

#[tokio::test]
async fn manual_tasks_toggle_back_and_forth() {
    let registry = SessionRegistry::default();
    let session = registry.create().await;

    let task = registry
        .add_task(&session.id, "  Stretch  ", Some("2026-10-20".into()))
        .await
        .unwrap();
    assert_eq!(task.title, "Stretch");
    assert_eq!(task.origin, TaskOrigin::Manual);
    assert_eq!(task.status, TaskStatus::Pending);

    let status = registry.toggle_task(&session.id, &task.id).await.unwrap();
    assert_eq!(status, TaskStatus::Completed);
    let status = registry.toggle_task(&session.id, &task.id).await.unwrap();
    assert_eq!(status, TaskStatus::Pending);

    let err = registry.toggle_task(&session.id, "missing").await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let err = registry.add_task(&session.id, " ", None).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clearing_short_term_keeps_long_term() {
    let companion = heuristic_companion();
    let registry = SessionRegistry::default();
    let session = registry.create().await;

    registry
        .send_message(&companion, &session.id, "hello")
        .await
        .unwrap();
    {
        let shared = registry.get(&session.id).await.unwrap();
        shared.lock().await.remember_long_term("Enjoys yoga");
    }

    registry.clear_short_term(&session.id).await.unwrap();
    let snapshot = registry.snapshot(&session.id).await.unwrap();
    assert!(snapshot.short_term.is_empty());
    assert_eq!(snapshot.long_term_facts(), vec!["Enjoys yoga"]);
    assert_eq!(snapshot.conversation.len(), 3);
}

#[tokio::test]
async fn removed_sessions_are_gone() {
    let registry = SessionRegistry::default();
    let kept = registry.create().await;
    let dropped = registry.create().await;
    assert_eq!(registry.len().await, 2);

    registry.remove(&dropped.id).await.unwrap();
    assert_eq!(registry.len().await, 1);
    assert!(registry.snapshot(&kept.id).await.is_ok());

    let err = registry.snapshot(&dropped.id).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    let err = registry.remove(&dropped.id).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}
