//! Unit tests for SessionRepository.
//!
//! Covers owner scoping, recency ordering, idempotent deletion, and touch.

use kokoro_core::{MessageRole, SessionCategory};
use tempfile::TempDir;

use crate::message_repo::MessageRepository;
use crate::models::{MessageRecord, SessionRecord};
use crate::session_repo::SessionRepository;
use crate::sqlite_pool::SqlitePoolManager;

async fn test_repos() -> (SessionRepository, MessageRepository, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let pool = SqlitePoolManager::new(db_path.to_str().unwrap())
        .await
        .expect("Failed to create pool");
    let sessions = SessionRepository::new(pool.clone());
    let messages = MessageRepository::new(pool);
    sessions.init().await.expect("Failed to init sessions");
    messages.init().await.expect("Failed to init messages");
    (sessions, messages, dir)
}

#[tokio::test]
async fn test_create_and_find_for_owner() {
    let (sessions, _, _dir) = test_repos().await;
    let record = SessionRecord::new("user-a", SessionCategory::Life, Some("相談".to_string()));
    sessions.create(&record).await.unwrap();

    let found = sessions.find_for_user(&record.id, "user-a").await.unwrap();
    assert!(found.is_some());
    let found = found.unwrap();
    assert_eq!(found.id, record.id);
    assert_eq!(found.category(), SessionCategory::Life);
    assert_eq!(found.title.as_deref(), Some("相談"));
}

#[tokio::test]
async fn test_find_for_other_user_returns_none() {
    let (sessions, _, _dir) = test_repos().await;
    let record = SessionRecord::new("user-a", SessionCategory::Love, None);
    sessions.create(&record).await.unwrap();

    let found = sessions.find_for_user(&record.id, "user-b").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_list_orders_by_updated_at_desc() {
    let (sessions, _, _dir) = test_repos().await;
    let first = SessionRecord::new("user-a", SessionCategory::Life, Some("first".to_string()));
    let second = SessionRecord::new("user-a", SessionCategory::Life, Some("second".to_string()));
    sessions.create(&first).await.unwrap();
    sessions.create(&second).await.unwrap();

    // Touching the older session moves it to the front.
    sessions.touch(&first.id).await.unwrap();

    let listed = sessions.list_for_user("user-a", 50).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
}

#[tokio::test]
async fn test_list_respects_limit_and_owner() {
    let (sessions, _, _dir) = test_repos().await;
    for _ in 0..5 {
        sessions
            .create(&SessionRecord::new("user-a", SessionCategory::Life, None))
            .await
            .unwrap();
    }
    sessions
        .create(&SessionRecord::new("user-b", SessionCategory::Life, None))
        .await
        .unwrap();

    let listed = sessions.list_for_user("user-a", 3).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|s| s.user_id == "user-a"));
}

#[tokio::test]
async fn test_delete_removes_session_and_messages() {
    let (sessions, messages, _dir) = test_repos().await;
    let record = SessionRecord::new("user-a", SessionCategory::Relationship, None);
    sessions.create(&record).await.unwrap();
    messages
        .save(&MessageRecord::new(
            &record.id,
            MessageRole::User,
            "hello".to_string(),
        ))
        .await
        .unwrap();

    let removed = sessions.delete_for_user(&record.id, "user-a").await.unwrap();
    assert_eq!(removed, 1);
    assert!(sessions
        .find_for_user(&record.id, "user-a")
        .await
        .unwrap()
        .is_none());
    assert!(messages
        .list_for_session(&record.id, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_absent_or_foreign_is_zero_rows() {
    let (sessions, _, _dir) = test_repos().await;
    let record = SessionRecord::new("user-a", SessionCategory::Life, None);
    sessions.create(&record).await.unwrap();

    assert_eq!(sessions.delete_for_user("no-such", "user-a").await.unwrap(), 0);
    assert_eq!(
        sessions.delete_for_user(&record.id, "user-b").await.unwrap(),
        0
    );
    // The owner's session is still there.
    assert!(sessions
        .find_for_user(&record.id, "user-a")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_touch_bumps_updated_at() {
    let (sessions, _, _dir) = test_repos().await;
    let record = SessionRecord::new("user-a", SessionCategory::Life, None);
    sessions.create(&record).await.unwrap();

    sessions.touch(&record.id).await.unwrap();

    let found = sessions
        .find_for_user(&record.id, "user-a")
        .await
        .unwrap()
        .unwrap();
    assert!(found.updated_at >= record.updated_at);
}
