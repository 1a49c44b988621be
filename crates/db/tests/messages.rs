//! Integration tests for message visibility and read-state behaviour.
//!
//! Exercises the repository layer against a real database to verify that:
//! - Visibility requires `send_at` due, not hidden, logged, and not deleted
//! - `unread_count` only counts visible unread messages
//! - `mark_read` and `mark_all_read` are idempotent and only touch the
//!   owner's visible messages
//! - `list_unprocessed` selects due, unlogged messages
//! - `mark_logged_if_complete` skips messages with pending logs

use chrono::{Duration, Utc};
use inbox_db::models::message::CreateMessage;
use inbox_db::repositories::{MessageLogRepo, MessageRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_message(user_id: i64, key: &str) -> CreateMessage {
    CreateMessage {
        user_id,
        key: key.to_string(),
        subject: format!("subject for {key}"),
        body: "hello".to_string(),
        data: None,
        send_at: None,
        is_hidden: None,
    }
}

/// Create a message and flip it to logged so it becomes visible.
async fn create_visible(pool: &PgPool, user_id: i64, key: &str) -> i64 {
    let id = MessageRepo::create(pool, &new_message(user_id, key))
        .await
        .unwrap();
    let flipped = MessageRepo::mark_logged_if_complete(pool, &[id]).await.unwrap();
    assert_eq!(flipped, vec![id]);
    id
}

// ---------------------------------------------------------------------------
// Test: visibility filter
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unlogged_message_is_not_visible(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();
    let id = MessageRepo::create(&pool, &new_message(user_id, "welcome"))
        .await
        .unwrap();

    let visible = MessageRepo::list_visible(&pool, user_id, 50, 0).await.unwrap();
    assert!(
        visible.is_empty(),
        "message should stay hidden until fan-out marks it logged"
    );

    MessageRepo::mark_logged_if_complete(&pool, &[id]).await.unwrap();
    let visible = MessageRepo::list_visible(&pool, user_id, 50, 0).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_future_send_at_is_not_visible(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();
    let mut input = new_message(user_id, "digest");
    input.send_at = Some(Utc::now() + Duration::hours(1));
    let id = MessageRepo::create(&pool, &input).await.unwrap();

    // Even a logged message stays hidden until send_at passes. Flip the flag
    // directly since list_unprocessed would not pick a future message up.
    sqlx::query("UPDATE messages SET is_logged = true WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let visible = MessageRepo::list_visible(&pool, user_id, 50, 0).await.unwrap();
    assert!(visible.is_empty(), "future message should not be visible yet");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_hidden_and_deleted_excluded(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();

    let mut hidden = new_message(user_id, "silent_push");
    hidden.is_hidden = Some(true);
    let hidden_id = MessageRepo::create(&pool, &hidden).await.unwrap();
    MessageRepo::mark_logged_if_complete(&pool, &[hidden_id]).await.unwrap();

    let deleted_id = create_visible(&pool, user_id, "welcome").await;
    assert!(MessageRepo::soft_delete(&pool, deleted_id).await.unwrap());

    let kept_id = create_visible(&pool, user_id, "welcome_back").await;

    let visible = MessageRepo::list_visible(&pool, user_id, 50, 0).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, kept_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_visible_orders_newest_first(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();

    let mut old = new_message(user_id, "older");
    old.send_at = Some(Utc::now() - Duration::hours(2));
    let old_id = MessageRepo::create(&pool, &old).await.unwrap();
    MessageRepo::mark_logged_if_complete(&pool, &[old_id]).await.unwrap();

    let new_id = create_visible(&pool, user_id, "newer").await;

    let visible = MessageRepo::list_visible(&pool, user_id, 50, 0).await.unwrap();
    let ids: Vec<i64> = visible.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![new_id, old_id]);
}

// ---------------------------------------------------------------------------
// Test: unread count and mark-all-read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unread_count_and_mark_all_read(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();
    let other_user = UserRepo::create(&pool, "b@example.com").await.unwrap();

    create_visible(&pool, user_id, "one").await;
    create_visible(&pool, user_id, "two").await;
    create_visible(&pool, other_user, "theirs").await;

    // An unlogged message should not count as unread.
    MessageRepo::create(&pool, &new_message(user_id, "pending"))
        .await
        .unwrap();

    assert_eq!(MessageRepo::unread_count(&pool, user_id).await.unwrap(), 2);

    let changed = MessageRepo::mark_all_read(&pool, user_id).await.unwrap();
    assert_eq!(changed, 2);
    assert_eq!(MessageRepo::unread_count(&pool, user_id).await.unwrap(), 0);

    // Idempotent: second pass changes nothing.
    let changed = MessageRepo::mark_all_read(&pool, user_id).await.unwrap();
    assert_eq!(changed, 0);

    // The other user's inbox is untouched.
    assert_eq!(MessageRepo::unread_count(&pool, other_user).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_read_single_message_is_idempotent(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();
    let other_user = UserRepo::create(&pool, "b@example.com").await.unwrap();
    let id = create_visible(&pool, user_id, "welcome").await;
    create_visible(&pool, user_id, "still_unread").await;

    assert!(MessageRepo::mark_read(&pool, id, user_id).await.unwrap());
    assert_eq!(MessageRepo::unread_count(&pool, user_id).await.unwrap(), 1);

    let message = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(message.is_read);
    assert!(message.read_at.is_some(), "read_at should be stamped");

    // Re-reading an already-read message is a no-op.
    assert!(!MessageRepo::mark_read(&pool, id, user_id).await.unwrap());

    // Another user cannot touch the message.
    let foreign_id = create_visible(&pool, other_user, "theirs").await;
    assert!(!MessageRepo::mark_read(&pool, foreign_id, user_id).await.unwrap());
    assert_eq!(MessageRepo::unread_count(&pool, other_user).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_read_ignores_invisible_messages(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();
    let unlogged_id = MessageRepo::create(&pool, &new_message(user_id, "pending"))
        .await
        .unwrap();

    assert!(
        !MessageRepo::mark_read(&pool, unlogged_id, user_id).await.unwrap(),
        "a message still in fan-out cannot be marked read"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_all_read_sets_read_at(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();
    let id = create_visible(&pool, user_id, "welcome").await;

    MessageRepo::mark_all_read(&pool, user_id).await.unwrap();

    let message = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(message.is_read);
    assert!(message.read_at.is_some(), "read_at should be stamped");
}

// ---------------------------------------------------------------------------
// Test: fan-out selection and completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_unprocessed_skips_future_and_deleted(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();

    let due_id = MessageRepo::create(&pool, &new_message(user_id, "due"))
        .await
        .unwrap();

    let mut future = new_message(user_id, "future");
    future.send_at = Some(Utc::now() + Duration::hours(1));
    MessageRepo::create(&pool, &future).await.unwrap();

    let deleted_id = MessageRepo::create(&pool, &new_message(user_id, "deleted"))
        .await
        .unwrap();
    MessageRepo::soft_delete(&pool, deleted_id).await.unwrap();

    let unprocessed = MessageRepo::list_unprocessed(&pool, 100).await.unwrap();
    let ids: Vec<i64> = unprocessed.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![due_id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_logged_waits_for_pending_logs(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "a@example.com").await.unwrap();
    let id = MessageRepo::create(&pool, &new_message(user_id, "welcome"))
        .await
        .unwrap();

    assert!(MessageLogRepo::claim(&pool, id, "app_push").await.unwrap());

    // A pending log blocks completion.
    let flipped = MessageRepo::mark_logged_if_complete(&pool, &[id]).await.unwrap();
    assert!(flipped.is_empty(), "pending log should block is_logged");

    let mut conn = pool.acquire().await.unwrap();
    let logs = MessageLogRepo::list_for_message(&pool, id).await.unwrap();
    assert!(MessageLogRepo::mark_sent(&mut conn, logs[0].id).await.unwrap());
    drop(conn);

    let flipped = MessageRepo::mark_logged_if_complete(&pool, &[id]).await.unwrap();
    assert_eq!(flipped, vec![id]);

    // Already-logged messages are not returned again.
    let flipped = MessageRepo::mark_logged_if_complete(&pool, &[id]).await.unwrap();
    assert!(flipped.is_empty());
}
