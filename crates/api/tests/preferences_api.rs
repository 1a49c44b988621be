//! Integration tests for the `/preferences` endpoints, including the
//! token-addressed variants.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, get, send, TEST_SIGNING_SECRET};
use inbox_core::signing::sign_user_token;
use inbox_db::repositories::UserRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Test: authenticated endpoints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_preferences_returns_configured_groups(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();

    let response = get(build_test_app(pool), "/api/v1/preferences", Some(user_id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Built-in configuration carries the "default" group with app_push and
    // email enabled, sms and web_push unsupported.
    let json = body_json(response).await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "default");
    assert_eq!(results[0]["app_push"], true);
    assert_eq!(results[0]["email"], true);
    assert_eq!(results[0]["sms"], serde_json::Value::Null);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn targeted_update_overrides_one_medium(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();

    let response = send(
        build_test_app(pool.clone()),
        Method::PUT,
        "/api/v1/preferences/default/app_push",
        Some(user_id),
        Some(serde_json::json!(false)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["app_push"], false);
    assert_eq!(json["data"]["email"], true, "other mediums untouched");

    // Read back through GET.
    let response = get(build_test_app(pool), "/api/v1/preferences", Some(user_id)).await;
    let json = body_json(response).await;
    assert_eq!(json["results"][0]["app_push"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn targeted_update_unknown_group_returns_400(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();

    let response = send(
        build_test_app(pool),
        Method::PUT,
        "/api/v1/preferences/no-such-group/app_push",
        Some(user_id),
        Some(serde_json::json!(false)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_update_ignores_unknown_groups(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();

    let response = send(
        build_test_app(pool),
        Method::PUT,
        "/api/v1/preferences",
        Some(user_id),
        Some(serde_json::json!([
            {"id": "default", "email": false},
            {"id": "no-such-group", "email": false}
        ])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1, "unknown group is dropped, not an error");
    assert_eq!(results[0]["email"], false);
    assert_eq!(results[0]["app_push"], true);
}

// ---------------------------------------------------------------------------
// Test: token-addressed endpoints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn token_grants_sessionless_access(pool: PgPool) {
    let user_id = UserRepo::create(&pool, "prefs@example.com").await.unwrap();
    let token = sign_user_token(user_id, TEST_SIGNING_SECRET);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/preferences/token/{token}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["results"][0]["id"], "default");

    // Token-addressed targeted write.
    let response = send(
        build_test_app(pool),
        Method::PUT,
        &format!("/api/v1/preferences/token/{token}/default/email"),
        None,
        Some(serde_json::json!(false)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["email"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_token_returns_400(pool: PgPool) {
    let response = get(
        build_test_app(pool),
        "/api/v1/preferences/token/42.deadbeef",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn token_for_other_user_returns_403_when_authenticated(pool: PgPool) {
    let owner = UserRepo::create(&pool, "owner@example.com").await.unwrap();
    let intruder = UserRepo::create(&pool, "other@example.com").await.unwrap();
    let token = sign_user_token(owner, TEST_SIGNING_SECRET);

    let response = get(
        build_test_app(pool),
        &format!("/api/v1/preferences/token/{token}"),
        Some(intruder),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}
