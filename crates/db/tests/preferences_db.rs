//! Integration tests for stored preferences and device-group persistence.
//!
//! Exercises the repository layer against a real database to verify that:
//! - Users with no preference row read back an empty override sequence
//! - Saved override sequences round-trip through the JSONB column
//! - Saving replaces the previous sequence wholesale
//! - Notification keys upsert and clear correctly

use inbox_core::preferences::StoredGroup;
use inbox_db::repositories::{DeviceGroupRepo, MessagePreferencesRepo, UserRepo};
use sqlx::PgPool;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stored(id: &str, mediums: &[(&str, bool)]) -> StoredGroup {
    StoredGroup {
        id: id.to_string(),
        mediums: mediums
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
    }
}

// ---------------------------------------------------------------------------
// Test: stored preference groups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_row_reads_as_empty(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();
    let groups = MessagePreferencesRepo::get_groups(&pool, user_id).await.unwrap();
    assert!(groups.is_empty(), "a user with no row has no overrides");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_and_read_back(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();

    let groups = vec![
        stored("account", &[("app_push", false)]),
        stored("social", &[("app_push", true), ("email", false)]),
    ];
    MessagePreferencesRepo::save_groups(&pool, user_id, &groups).await.unwrap();

    let read = MessagePreferencesRepo::get_groups(&pool, user_id).await.unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].id, "account");
    assert_eq!(read[0].mediums.get("app_push"), Some(&false));
    assert_eq!(read[1].mediums.get("email"), Some(&false));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_replaces_previous_sequence(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();

    MessagePreferencesRepo::save_groups(&pool, user_id, &[stored("account", &[("email", false)])])
        .await
        .unwrap();
    MessagePreferencesRepo::save_groups(&pool, user_id, &[stored("social", &[("app_push", false)])])
        .await
        .unwrap();

    let read = MessagePreferencesRepo::get_groups(&pool, user_id).await.unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].id, "social");
}

// ---------------------------------------------------------------------------
// Test: device groups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notification_key_lifecycle(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "device@example.com").await.unwrap();

    assert_eq!(
        DeviceGroupRepo::get_notification_key(&pool, user_id).await.unwrap(),
        None
    );

    DeviceGroupRepo::upsert_key(&pool, user_id, "key-1", Some("user-1-devices"))
        .await
        .unwrap();
    assert_eq!(
        DeviceGroupRepo::get_notification_key(&pool, user_id).await.unwrap(),
        Some("key-1".to_string())
    );

    // Re-registering replaces the key in place.
    DeviceGroupRepo::upsert_key(&pool, user_id, "key-2", Some("user-1-devices"))
        .await
        .unwrap();
    assert_eq!(
        DeviceGroupRepo::get_notification_key(&pool, user_id).await.unwrap(),
        Some("key-2".to_string())
    );

    assert!(DeviceGroupRepo::clear_notification_key(&pool, user_id).await.unwrap());
    assert_eq!(
        DeviceGroupRepo::get_notification_key(&pool, user_id).await.unwrap(),
        None
    );

    // Clearing again is a no-op.
    assert!(!DeviceGroupRepo::clear_notification_key(&pool, user_id).await.unwrap());

    let row = DeviceGroupRepo::get(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(row.notification_key, None);
    assert_eq!(row.notification_key_name.as_deref(), Some("user-1-devices"));
}
