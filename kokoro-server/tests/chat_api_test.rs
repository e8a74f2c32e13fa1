//! Integration tests for the chat endpoints: streaming protocol, persistence
//! ordering, knowledge injection, and failure handling.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use prompt::MessageRole;
use serde_json::json;

use common::*;

#[tokio::test]
async fn test_new_session_streams_reply_and_persists_both_messages() {
    let llm = Arc::new(MockLlm::with_chunks(&["それは", "大変でしたね。"]));
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let response = send(
        &router,
        "POST",
        "/api/chat",
        Some(USER_A),
        Some(json!({"message": "会社の上司に怒られた"})),
    )
    .await;
    assert_status(&response, StatusCode::OK);

    let body = body_text(response).await;
    let events = sse_events(&body);

    // First event carries the new session id.
    assert_eq!(events[0]["type"], "meta");
    let session_id = events[0]["sessionId"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());

    // Terminal event is done, never error.
    assert_eq!(events.last().unwrap()["type"], "done");
    assert!(events.iter().all(|e| e["type"] != "error"));

    // Delta concatenation equals the persisted assistant reply.
    assert_eq!(delta_text(&events), "それは大変でしたね。");

    let sessions = state.sessions.list_for_user(USER_A, 50).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session_id);
    assert_eq!(sessions[0].category, "life");
    assert_eq!(sessions[0].title.as_deref(), Some("会社の上司に怒られた"));

    let messages = state.messages.list_for_session(&session_id, 200).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");
    assert_eq!(messages[0].content, "会社の上司に怒られた");
    assert_eq!(messages[1].role, "assistant");
    assert_eq!(messages[1].content, "それは大変でしたね。");
}

#[tokio::test]
async fn test_existing_session_appends_instead_of_creating() {
    let llm = Arc::new(MockLlm::with_chunks(&["応答"]));
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let first = send(
        &router,
        "POST",
        "/api/chat",
        Some(USER_A),
        Some(json!({"message": "最初の相談"})),
    )
    .await;
    let events = sse_events(&body_text(first).await);
    let session_id = events[0]["sessionId"].as_str().unwrap().to_string();

    let second = send(
        &router,
        "POST",
        "/api/chat",
        Some(USER_A),
        Some(json!({"sessionId": session_id, "message": "続きの相談"})),
    )
    .await;
    assert_status(&second, StatusCode::OK);
    let events = sse_events(&body_text(second).await);
    assert_eq!(events[0]["sessionId"], session_id.as_str());

    assert_eq!(state.sessions.list_for_user(USER_A, 50).await.unwrap().len(), 1);
    assert_eq!(
        state
            .messages
            .list_for_session(&session_id, 200)
            .await
            .unwrap()
            .len(),
        4
    );
}

#[tokio::test]
async fn test_foreign_session_is_not_found_and_writes_nothing() {
    let llm = Arc::new(MockLlm::with_chunks(&["応答"]));
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let foreign = storage::SessionRecord::new(
        USER_B,
        kokoro_core::SessionCategory::Life,
        Some("他人の相談".to_string()),
    );
    state.sessions.create(&foreign).await.unwrap();

    let response = send(
        &router,
        "POST",
        "/api/chat",
        Some(USER_A),
        Some(json!({"sessionId": foreign.id, "message": "覗き見"})),
    )
    .await;
    assert_status(&response, StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Session not found");

    assert!(state
        .messages
        .list_for_session(&foreign.id, 200)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_whitespace_reply_ends_in_error_and_persists_no_assistant() {
    let llm = Arc::new(MockLlm::with_chunks(&["  ", "\n"]));
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let response = send(
        &router,
        "POST",
        "/api/chat",
        Some(USER_A),
        Some(json!({"message": "誰か助けて"})),
    )
    .await;
    assert_status(&response, StatusCode::OK);

    let events = sse_events(&body_text(response).await);
    let session_id = events[0]["sessionId"].as_str().unwrap().to_string();

    let terminal = events.last().unwrap();
    assert_eq!(terminal["type"], "error");
    assert_eq!(
        terminal["message"],
        "回答を生成できませんでした。もう一度お試しください。"
    );
    assert!(events.iter().all(|e| e["type"] != "done"));

    // Only the inbound user message was persisted.
    let messages = state.messages.list_for_session(&session_id, 200).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, "user");
}

#[tokio::test]
async fn test_completion_failure_ends_in_error() {
    let llm = Arc::new(MockLlm::failing());
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let response = send(
        &router,
        "POST",
        "/api/chat",
        Some(USER_A),
        Some(json!({"message": "調子が悪い"})),
    )
    .await;
    assert_status(&response, StatusCode::OK);

    let events = sse_events(&body_text(response).await);
    let session_id = events[0]["sessionId"].as_str().unwrap().to_string();
    assert_eq!(events.last().unwrap()["type"], "error");

    let messages = state.messages.list_for_session(&session_id, 200).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_knowledge_meta_event_and_context_injection() {
    let llm = Arc::new(MockLlm::with_chunks(&["参考を踏まえた応答"]));
    let chunk = matching_chunk("傾聴ではまず相手の感情を言い換えて返す", Some("handbook"));
    let (router, _state, _dir) = test_app(llm.clone(), vec![chunk], true).await;

    let response = send(
        &router,
        "POST",
        "/api/chat",
        Some(USER_A),
        Some(json!({"message": "話を聞いてほしい"})),
    )
    .await;
    let events = sse_events(&body_text(response).await);

    // meta → deltas → meta(knowledge) → done
    assert_eq!(events[0]["type"], "meta");
    assert_eq!(events.last().unwrap()["type"], "done");
    let knowledge_meta = events
        .iter()
        .find(|e| e["type"] == "meta" && e.get("knowledge").is_some())
        .expect("knowledge meta event expected");
    let knowledge = knowledge_meta["knowledge"].as_array().unwrap();
    assert_eq!(knowledge.len(), 1);
    assert!(knowledge[0]["similarity"].as_f64().unwrap() > 0.99);
    assert_eq!(knowledge[0]["source"], "handbook");
    assert!(knowledge[0]["preview"]
        .as_str()
        .unwrap()
        .contains("傾聴"));

    // The model saw the persona first and the reference block spliced in
    // right before the latest user turn.
    let captured = llm.captured.lock().unwrap();
    assert_eq!(captured[0].role, MessageRole::System);
    assert!(captured[0].content.contains("カウンセラー"));
    let block_index = captured
        .iter()
        .position(|t| t.role == MessageRole::System && t.content.contains("【参考1】"))
        .expect("context block should be injected");
    assert_eq!(captured[block_index + 1].role, MessageRole::User);
    assert_eq!(captured[block_index + 1].content, "話を聞いてほしい");
    assert_eq!(block_index + 2, captured.len());
}

#[tokio::test]
async fn test_validation_failures_are_synchronous_400s() {
    let llm = Arc::new(MockLlm::with_chunks(&["応答"]));
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let cases = vec![
        json!({}),
        json!({"message": "   "}),
        json!({"message": "あ".repeat(2001)}),
        json!({"message": "ok", "category": "work"}),
        json!({"message": "ok", "sessionId": "not-a-uuid"}),
    ];

    for body in cases {
        let response = send(&router, "POST", "/api/chat", Some(USER_A), Some(body)).await;
        assert_status(&response, StatusCode::BAD_REQUEST);
    }

    // Nothing was created along the way.
    assert!(state.sessions.list_for_user(USER_A, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_identity_without_demo_mode_is_unauthorized() {
    let llm = Arc::new(MockLlm::with_chunks(&["応答"]));
    let (router, _state, _dir) = test_app(llm, vec![], false).await;

    let response = send(
        &router,
        "POST",
        "/api/chat",
        None,
        Some(json!({"message": "こんにちは"})),
    )
    .await;
    assert_status(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_demo_mode_substitutes_fixed_identity() {
    let llm = Arc::new(MockLlm::with_chunks(&["応答"]));
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let response = send(
        &router,
        "POST",
        "/api/chat",
        None,
        Some(json!({"message": "お試し相談"})),
    )
    .await;
    assert_status(&response, StatusCode::OK);
    let _ = body_text(response).await;

    let demo_id = state.config.demo_user_id.clone();
    let sessions = state.sessions.list_for_user(&demo_id, 50).await.unwrap();
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_sync_endpoint_returns_reply_and_knowledge() {
    let llm = Arc::new(MockLlm::with_chunks(&["同期", "応答"]));
    let chunk = matching_chunk("参考資料", None);
    let (router, state, _dir) = test_app(llm, vec![chunk], true).await;

    let response = send(
        &router,
        "POST",
        "/api/chat/sync",
        Some(USER_A),
        Some(json!({"message": "同期でお願いします", "category": "love"})),
    )
    .await;
    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;

    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert_eq!(body["reply"], "同期応答");
    assert_eq!(body["knowledge"].as_array().unwrap().len(), 1);

    let sessions = state.sessions.list_for_user(USER_A, 50).await.unwrap();
    assert_eq!(sessions[0].category, "love");

    let messages = state.messages.list_for_session(&session_id, 200).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "同期応答");
}

#[tokio::test]
async fn test_sync_endpoint_whitespace_reply_is_bad_gateway() {
    let llm = Arc::new(MockLlm::with_chunks(&["   "]));
    let (router, state, _dir) = test_app(llm, vec![], true).await;

    let response = send(
        &router,
        "POST",
        "/api/chat/sync",
        Some(USER_A),
        Some(json!({"message": "応答が空のとき"})),
    )
    .await;
    assert_status(&response, StatusCode::BAD_GATEWAY);

    let sessions = state.sessions.list_for_user(USER_A, 50).await.unwrap();
    let messages = state
        .messages
        .list_for_session(&sessions[0].id, 200)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
}
