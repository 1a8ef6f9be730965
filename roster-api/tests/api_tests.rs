/// HTTP tests for the roster API
///
/// Requests that are rejected before any query runs use a router over a
/// pool that never connects. The end-to-end tests need PostgreSQL and are
/// ignored by default. Run them with:
/// cargo test --test api_tests -- --ignored --test-threads=1

mod common;

use axum::http::StatusCode;
use common::{lazy_app, send, TestContext};
use serde_json::json;
use uuid::Uuid;

fn field_names(body: &serde_json::Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_create_user_validation() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/users",
        Some(json!({
            "name": "A",
            "email": "not-an-email",
            "roles": [],
            "bio": "x".repeat(301),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(field_names(&body), vec!["bio", "email", "name", "roles"]);
}

#[tokio::test]
async fn test_create_user_rejects_unknown_role() {
    let (status, body) = send(
        &lazy_app(),
        "POST",
        "/v1/users",
        Some(json!({ "name": "Ada", "email": "ada@example.com", "roles": ["owner"] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["roles"]);
}

#[tokio::test]
async fn test_update_user_validation() {
    let uri = format!("/v1/users/{}", Uuid::new_v4());
    let (status, body) = send(
        &lazy_app(),
        "PUT",
        &uri,
        Some(json!({ "email": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["email"]);
}

#[tokio::test]
async fn test_reorder_rejects_duplicate_targets() {
    let (status, body) = send(
        &lazy_app(),
        "PUT",
        "/v1/users/positions",
        Some(json!({
            "updates": [
                { "id": Uuid::new_v4(), "newPosition": 2 },
                { "id": Uuid::new_v4(), "newPosition": 2 },
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_reorder_rejects_non_positive_target() {
    let (status, _) = send(
        &lazy_app(),
        "PUT",
        "/v1/users/positions",
        Some(json!({ "updates": [ { "id": Uuid::new_v4(), "newPosition": 0 } ] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gallery_reorder_rejects_duplicate_ids() {
    let image = Uuid::new_v4();
    let uri = format!("/v1/users/{}/images/positions", Uuid::new_v4());
    let (status, _) = send(
        &lazy_app(),
        "PUT",
        &uri,
        Some(json!({
            "updates": [
                { "id": image, "newPosition": 1 },
                { "id": image, "newPosition": 2 },
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_image_requires_url() {
    let uri = format!("/v1/users/{}/images", Uuid::new_v4());
    let (status, body) = send(&lazy_app(), "POST", &uri, Some(json!({ "url": "photo.png" }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["url"]);
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = send(&lazy_app(), "GET", "/v1/tasks", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let (status, body) = send(&lazy_app(), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_user_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let mut ids = Vec::new();
    for name in ["Ann", "Bob", "Cid"] {
        let (status, body) = send(
            &ctx.app,
            "POST",
            "/v1/users",
            Some(json!({
                "name": name,
                "email": "team@example.com",
                "roles": ["editor"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let (_, body) = send(&ctx.app, "GET", "/v1/users", None).await;
    let emails: Vec<&str> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(
        emails,
        vec!["team@example.com", "team+1@example.com", "team+2@example.com"]
    );

    let (status, body) = send(
        &ctx.app,
        "PUT",
        "/v1/users/positions",
        Some(json!({ "updates": [ { "id": ids[2], "newPosition": 1 } ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["moved"], 1);

    let (status, _) = send(&ctx.app, "DELETE", &format!("/v1/users/{}", ids[0]), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&ctx.app, "GET", "/v1/users", None).await;
    let listing: Vec<(String, i64)> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| (u["id"].as_str().unwrap().to_string(), u["position"].as_i64().unwrap()))
        .collect();
    assert_eq!(listing, vec![(ids[2].clone(), 1), (ids[1].clone(), 2)]);

    let (status, _) = send(&ctx.app, "GET", &format!("/v1/users/{}", ids[0]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_reorder_out_of_range_is_bad_request() {
    let ctx = TestContext::new().await.unwrap();

    let (_, user) = send(
        &ctx.app,
        "POST",
        "/v1/users",
        Some(json!({ "name": "Ann", "email": "ann@example.com", "roles": ["admin"] })),
    )
    .await;

    let (status, _) = send(
        &ctx.app,
        "PUT",
        "/v1/users/positions",
        Some(json!({ "updates": [ { "id": user["id"], "newPosition": 2 } ] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_gallery_flow() {
    let ctx = TestContext::new().await.unwrap();

    let (_, user) = send(
        &ctx.app,
        "POST",
        "/v1/users",
        Some(json!({ "name": "Ann", "email": "ann@example.com", "roles": ["viewer"] })),
    )
    .await;
    let user_id = user["id"].as_str().unwrap().to_string();

    let mut images = Vec::new();
    for i in 0..3 {
        let (status, body) = send(
            &ctx.app,
            "POST",
            &format!("/v1/users/{}/images", user_id),
            Some(json!({ "url": format!("https://cdn.example.com/{}.png", i) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["position"], i + 1);
        images.push(body["id"].as_str().unwrap().to_string());
    }

    let (status, _) = send(
        &ctx.app,
        "PUT",
        &format!("/v1/users/{}/images/positions", user_id),
        Some(json!({ "updates": [ { "id": images[0], "newPosition": 3 } ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&ctx.app, "DELETE", &format!("/v1/images/{}", images[1]), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&ctx.app, "GET", &format!("/v1/users/{}/images", user_id), None).await;
    let gallery: Vec<&str> = body["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|image| image["id"].as_str().unwrap())
        .collect();
    assert_eq!(gallery, vec![images[2].as_str(), images[0].as_str()]);

    let (status, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/users/{}/images", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
