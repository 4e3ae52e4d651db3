//! End-to-end tests against a real database. Each test gets its own
//! freshly-migrated database from `#[sqlx::test]` and drives the full router,
//! so ownership checks, cascades, and the summary query run the same SQL as
//! production.

use asset_maintenance_backend::{AppState, config::Config, router};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Days, Utc};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

fn app(pool: PgPool) -> Router {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "api-test-secret".into(),
        jwt_expiration_secs: 3600,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        due_soon_days: 7,
    };
    router(AppState { pool, config })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "Secret123!"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().expect("token").to_string()
}

async fn create_asset(app: &Router, token: &str, name: &str) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/assets",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["asset"]["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("asset id")
}

async fn create_maintenance(app: &Router, token: &str, payload: Value) -> Uuid {
    let (status, body) = send(app, "POST", "/maintenances", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["maintenance"]["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("maintenance id")
}

fn days_from_today(days: i64) -> String {
    let today = Utc::now().date_naive();
    let date = if days >= 0 {
        today + Days::new(days as u64)
    } else {
        today - Days::new((-days) as u64)
    };
    date.to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_registration_conflicts(pool: PgPool) {
    let app = app(pool);
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "Secret123!"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username or email already taken.");
}

#[sqlx::test(migrations = "./migrations")]
async fn login_works_with_username_or_email(pool: PgPool) {
    let app = app(pool);
    register(&app, "alice").await;

    for identifier in ["alice", "alice@example.com"] {
        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "identifier": identifier, "password": "Secret123!" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
    }

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "identifier": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn assets_are_invisible_across_users(pool: PgPool) {
    let app = app(pool);
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let asset_id = create_asset(&app, &alice, "Car").await;

    // Bob's view of Alice's asset is byte-identical to a truly absent id.
    let (status, body) = send(&app, "GET", &format!("/assets/{asset_id}"), Some(&bob), None).await;
    let (absent_status, absent_body) = send(
        &app,
        "GET",
        &format!("/assets/{}", Uuid::new_v4()),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(status, absent_status);
    assert_eq!(body, absent_body);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/assets/{asset_id}"),
        Some(&bob),
        Some(json!({ "name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/assets/{asset_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob's attempts left Alice's asset untouched.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/assets/{asset_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Car");

    let (_, body) = send(&app, "GET", "/assets", Some(&bob), None).await;
    assert_eq!(body["assets"].as_array().map(Vec::len), Some(0));
}

#[sqlx::test(migrations = "./migrations")]
async fn maintenances_are_invisible_across_users_and_assets(pool: PgPool) {
    let app = app(pool);
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let asset_id = create_asset(&app, &alice, "Car").await;
    let maintenance_id = create_maintenance(
        &app,
        &alice,
        json!({ "asset_id": asset_id, "service_description": "Oil change" }),
    )
    .await;

    // Bob cannot create under, list, read, update, or delete from Alice's
    // asset; every operation reports not-found.
    let (status, _) = send(
        &app,
        "POST",
        "/maintenances",
        Some(&bob),
        Some(json!({ "asset_id": asset_id, "service_description": "Sabotage" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let list_uri = format!("/maintenances/asset/{asset_id}");
    let (status, _) = send(&app, "GET", &list_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let item_uri = format!("/maintenances/asset/{asset_id}/{maintenance_id}");
    let (status, _) = send(&app, "GET", &item_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        &item_uri,
        Some(&bob),
        Some(json!({ "notes": "tampered" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &item_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A real maintenance id under the wrong asset is also not-found, even
    // for the owner.
    let other_asset = create_asset(&app, &alice, "Bike").await;
    let cross_uri = format!("/maintenances/asset/{other_asset}/{maintenance_id}");
    let (status, _) = send(&app, "GET", &cross_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The record is still there for its owner.
    let (status, body) = send(&app, "GET", &item_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["maintenance"]["service_description"], "Oil change");
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_an_asset_removes_its_maintenances(pool: PgPool) {
    let app = app(pool.clone());
    let alice = register(&app, "alice").await;
    let asset_id = create_asset(&app, &alice, "Car").await;
    for description in ["Oil change", "Tire rotation"] {
        create_maintenance(
            &app,
            &alice,
            json!({ "asset_id": asset_id, "service_description": description }),
        )
        .await;
    }

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/assets/{asset_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The asset is gone, so its maintenance listing is a 404...
    let (status, _) = send(
        &app,
        "GET",
        &format!("/maintenances/asset/{asset_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // ...and no orphaned rows survive in the store.
    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM maintenances WHERE asset_id = $1")
            .bind(asset_id)
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(remaining, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn summary_filters_and_orders_pending_maintenances(pool: PgPool) {
    let app = app(pool);
    let alice = register(&app, "alice").await;
    let asset_id = create_asset(&app, &alice, "Car").await;

    let overdue = create_maintenance(
        &app,
        &alice,
        json!({
            "asset_id": asset_id,
            "service_description": "Brake check",
            "next_due_date": days_from_today(-2)
        }),
    )
    .await;
    let due_soon = create_maintenance(
        &app,
        &alice,
        json!({
            "asset_id": asset_id,
            "service_description": "Oil change",
            "next_due_date": days_from_today(1)
        }),
    )
    .await;
    let due_later = create_maintenance(
        &app,
        &alice,
        json!({
            "asset_id": asset_id,
            "service_description": "Tire rotation",
            "next_due_date": days_from_today(5)
        }),
    )
    .await;
    // Excluded: completed, no due date, or beyond the horizon.
    create_maintenance(
        &app,
        &alice,
        json!({
            "asset_id": asset_id,
            "service_description": "Wiper blades",
            "next_due_date": days_from_today(1),
            "is_completed": true,
            "completion_date": days_from_today(0)
        }),
    )
    .await;
    create_maintenance(
        &app,
        &alice,
        json!({ "asset_id": asset_id, "service_description": "Wax" }),
    )
    .await;
    create_maintenance(
        &app,
        &alice,
        json!({
            "asset_id": asset_id,
            "service_description": "Inspection",
            "next_due_date": days_from_today(30)
        }),
    )
    .await;

    let (status, body) = send(&app, "GET", "/maintenances/summary", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<String> = body["maintenances"]
        .as_array()
        .expect("list")
        .iter()
        .map(|m| m["id"].as_str().expect("id").to_string())
        .collect();
    // Soonest (most overdue) first.
    assert_eq!(
        ids,
        vec![
            overdue.to_string(),
            due_soon.to_string(),
            due_later.to_string()
        ]
    );

    // Denormalized asset fields ride along for display.
    assert_eq!(body["maintenances"][0]["asset_name"], "Car");

    // A wider horizon pulls in the far-out entry.
    let (_, body) = send(
        &app,
        "GET",
        "/maintenances/summary?days=60",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(body["maintenances"].as_array().map(Vec::len), Some(4));
}

#[sqlx::test(migrations = "./migrations")]
async fn summary_only_covers_the_callers_assets(pool: PgPool) {
    let app = app(pool);
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let asset_id = create_asset(&app, &alice, "Car").await;
    create_maintenance(
        &app,
        &alice,
        json!({
            "asset_id": asset_id,
            "service_description": "Oil change",
            "next_due_date": days_from_today(1)
        }),
    )
    .await;

    let (status, body) = send(&app, "GET", "/maintenances/summary", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["maintenances"].as_array().map(Vec::len), Some(0));
}

#[sqlx::test(migrations = "./migrations")]
async fn register_to_completion_flow(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "alice").await;
    let asset_id = create_asset(&app, &token, "Car").await;

    let maintenance_id = create_maintenance(
        &app,
        &token,
        json!({
            "asset_id": asset_id,
            "service_description": "Oil change",
            "next_due_date": days_from_today(3)
        }),
    )
    .await;

    let (_, body) = send(&app, "GET", "/maintenances/summary", Some(&token), None).await;
    assert_eq!(
        body["maintenances"][0]["id"],
        maintenance_id.to_string().as_str()
    );
    assert_eq!(body["maintenances"][0]["is_completed"], false);

    let item_uri = format!("/maintenances/asset/{asset_id}/{maintenance_id}");

    // Completing without a date is rejected...
    let (status, body) = send(
        &app,
        "PUT",
        &item_uri,
        Some(&token),
        Some(json!({ "is_completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Completion date is required if maintenance is marked as completed."
    );

    // ...and succeeds with one.
    let (status, body) = send(
        &app,
        "PUT",
        &item_uri,
        Some(&token),
        Some(json!({ "is_completed": true, "completion_date": days_from_today(0) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], true);
    assert_eq!(body["completion_date"], days_from_today(0).as_str());

    // Completed work no longer shows up on the dashboard.
    let (_, body) = send(&app, "GET", "/maintenances/summary", Some(&token), None).await;
    assert_eq!(body["maintenances"].as_array().map(Vec::len), Some(0));
}

#[sqlx::test(migrations = "./migrations")]
async fn patch_clears_dates_and_notes_to_null(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "alice").await;
    let asset_id = create_asset(&app, &token, "Car").await;
    let maintenance_id = create_maintenance(
        &app,
        &token,
        json!({
            "asset_id": asset_id,
            "service_description": "Oil change",
            "completion_date": days_from_today(0),
            "next_due_date": days_from_today(3),
            "notes": "5W-30"
        }),
    )
    .await;

    let item_uri = format!("/maintenances/asset/{asset_id}/{maintenance_id}");
    let (status, body) = send(
        &app,
        "PUT",
        &item_uri,
        Some(&token),
        Some(json!({ "completion_date": "", "notes": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["completion_date"].is_null());
    assert!(body["notes"].is_null());
    // Untouched fields stay put.
    assert_eq!(body["next_due_date"], days_from_today(3).as_str());
}

#[sqlx::test(migrations = "./migrations")]
async fn completed_row_cannot_lose_its_date(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "alice").await;
    let asset_id = create_asset(&app, &token, "Car").await;
    let maintenance_id = create_maintenance(
        &app,
        &token,
        json!({
            "asset_id": asset_id,
            "service_description": "Oil change",
            "is_completed": true,
            "completion_date": days_from_today(0)
        }),
    )
    .await;

    let item_uri = format!("/maintenances/asset/{asset_id}/{maintenance_id}");

    // Clearing only the date would leave a completed row dateless.
    let (status, _) = send(
        &app,
        "PUT",
        &item_uri,
        Some(&token),
        Some(json!({ "completion_date": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Reopening the record and clearing the date together is fine.
    let (status, body) = send(
        &app,
        "PUT",
        &item_uri,
        Some(&token),
        Some(json!({ "is_completed": false, "completion_date": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], false);
    assert!(body["completion_date"].is_null());
}
