use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use trainforge::api::routes::create_routes;

mod common;
use common::{clean_database, create_test_user, test_pool, TEST_JWT_SECRET};

fn app(pool: sqlx::PgPool) -> Router {
    create_routes(pool, TEST_JWT_SECRET, None)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_training_lifecycle_with_nested_steps() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let (user_id, token) = create_test_user(&pool, "author@example.com").await;
    let app = app(pool);

    // Create a training with a two-level step tree.
    let payload = json!({
        "title": "Onboarding walkthrough",
        "description": "How to get started",
        "duration_minutes": 15,
        "steps": [
            {
                "step_number": 1,
                "annotation": "Open the dashboard",
                "steps": [
                    { "step_number": 1, "annotation": "Click the menu" },
                    { "step_number": 2, "annotation": "Pick a workspace" }
                ]
            },
            { "step_number": 2, "annotation": "Create a project" }
        ]
    });
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/v1/training", Some(&token), payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Onboarding walkthrough");
    assert_eq!(body["creator_id"], json!(user_id));
    assert_eq!(body["publish"], json!(false));
    assert_eq!(body["skip_steps"], json!(true));
    // The document carries all four steps flat.
    assert_eq!(body["steps"].as_array().unwrap().len(), 4);

    let uuid = body["uuid"].as_str().unwrap().to_string();

    // The steps endpoint assembles the tree.
    let (status, tree) = send(&app, get_request(&format!("/api/v1/training/{uuid}/steps"))).await;
    assert_eq!(status, StatusCode::OK);
    let roots = tree.as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["annotation"], "Open the dashboard");
    assert_eq!(roots[0]["steps"].as_array().unwrap().len(), 2);
    assert_eq!(roots[0]["steps"][0]["annotation"], "Click the menu");
    assert!(roots[1]["steps"].as_array().unwrap().is_empty());

    // Swap the root ordering.
    let first_id = roots[0]["id"].as_i64().unwrap();
    let second_id = roots[1]["id"].as_i64().unwrap();
    let reorder = json!({ "steps": [
        { "id": first_id, "step_number": 2 },
        { "id": second_id, "step_number": 1 }
    ]});
    let (status, report) = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/training/{uuid}/steps/reorder"),
            Some(&token),
            reorder,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["updated"], json!(2));

    let (_, tree) = send(&app, get_request(&format!("/api/v1/training/{uuid}/steps"))).await;
    assert_eq!(tree[0]["id"].as_i64().unwrap(), second_id);

    // Deleting a parent removes its subtree.
    let (status, _) = send(
        &app,
        json_request(
            Method::DELETE,
            &format!("/api/v1/training/{uuid}/steps/{first_id}"),
            Some(&token),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, tree) = send(&app, get_request(&format!("/api/v1/training/{uuid}/steps"))).await;
    assert_eq!(tree.as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["id"].as_i64().unwrap(), second_id);

    // Deleting the training cascades.
    let (status, _) = send(
        &app,
        json_request(
            Method::DELETE,
            &format!("/api/v1/training/{uuid}"),
            Some(&token),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get_request(&format!("/api/v1/training/{uuid}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reorder_rejects_foreign_step_ids() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let (_, token) = create_test_user(&pool, "reorder@example.com").await;
    let app = app(pool);

    let (_, first) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            Some(&token),
            json!({
                "title": "First",
                "description": "first",
                "steps": [{ "step_number": 1 }]
            }),
        ),
    )
    .await;
    let (_, second) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            Some(&token),
            json!({
                "title": "Second",
                "description": "second",
                "steps": [{ "step_number": 1 }]
            }),
        ),
    )
    .await;

    let first_uuid = first["uuid"].as_str().unwrap();
    let foreign_step_id = second["steps"][0]["id"].as_i64().unwrap();

    // A step id from another training must reject the whole batch.
    let own_step_id = first["steps"][0]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/training/{first_uuid}/steps/reorder"),
            Some(&token),
            json!({ "steps": [
                { "id": own_step_id, "step_number": 5 },
                { "id": foreign_step_id, "step_number": 6 }
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // And nothing was renumbered.
    let (_, tree) = send(
        &app,
        get_request(&format!("/api/v1/training/{first_uuid}/steps")),
    )
    .await;
    assert_eq!(tree[0]["step_number"], json!(1));
}

#[tokio::test]
async fn test_step_mutations_are_scoped_to_training() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let (_, token) = create_test_user(&pool, "scoped@example.com").await;
    let app = app(pool);

    let (_, first) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            Some(&token),
            json!({
                "title": "First",
                "description": "first",
                "steps": [{ "step_number": 1 }]
            }),
        ),
    )
    .await;
    let (_, second) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            Some(&token),
            json!({ "title": "Second", "description": "second" }),
        ),
    )
    .await;

    let step_id = first["steps"][0]["id"].as_i64().unwrap();
    let second_uuid = second["uuid"].as_str().unwrap();

    // Addressing the step through the wrong training is a 404.
    let (status, _) = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/training/{second_uuid}/steps/{step_id}"),
            Some(&token),
            json!({ "annotation": "hijack" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request(
            Method::DELETE,
            &format!("/api/v1/training/{second_uuid}/steps/{step_id}"),
            Some(&token),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_step_operations() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let (_, token) = create_test_user(&pool, "bulk@example.com").await;
    let app = app(pool);

    let (_, training) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            Some(&token),
            json!({ "title": "Bulk", "description": "bulk" }),
        ),
    )
    .await;
    let uuid = training["uuid"].as_str().unwrap().to_string();

    let (status, created) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/v1/training/{uuid}/steps/bulk"),
            Some(&token),
            json!({ "steps": [
                { "step_number": 1 },
                { "step_number": 2 },
                { "step_number": 3 }
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ids: Vec<i64> = created
        .as_array()
        .unwrap()
        .iter()
        .map(|step| step["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);

    // Bulk delete reports unknown ids instead of failing.
    let (status, report) = send(
        &app,
        json_request(
            Method::DELETE,
            &format!("/api/v1/training/{uuid}/steps"),
            Some(&token),
            json!({ "step_ids": [ids[0], ids[1], 999_999] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["deleted"], json!(2));
    assert_eq!(report["not_found"], json!([999_999]));
    assert_eq!(report["total_requested"], json!(3));
}

#[tokio::test]
async fn test_patch_training_updates_fields_tags_and_steps() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let (_, token) = create_test_user(&pool, "patch@example.com").await;
    let app = app(pool);

    let (status, tag) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/tags",
            Some(&token),
            json!({ "label": "beginner" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tag_value = tag["value"].as_i64().unwrap();

    let (_, training) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            Some(&token),
            json!({
                "title": "Draft",
                "description": "draft",
                "steps": [{ "step_number": 1, "annotation": "old" }]
            }),
        ),
    )
    .await;
    let uuid = training["uuid"].as_str().unwrap().to_string();
    let step_id = training["steps"][0]["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/training/{uuid}"),
            Some(&token),
            json!({
                "title": "Published",
                "publish": true,
                "tag_ids": [tag_value],
                "steps": [
                    { "id": step_id, "annotation": "new" },
                    { "step_number": 2, "annotation": "added" }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Published");
    assert_eq!(updated["publish"], json!(true));
    // Untouched fields survive the patch.
    assert_eq!(updated["description"], "draft");
    assert_eq!(updated["tags"][0]["label"], "beginner");

    let steps = updated["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["annotation"], "new");
    assert_eq!(steps[1]["annotation"], "added");

    // The tag now reports one training.
    let (_, with_count) = send(&app, get_request("/api/v1/tags/with-count")).await;
    assert_eq!(with_count[0]["trainings_count"], json!(1));
}

#[tokio::test]
async fn test_mutations_require_bearer_token() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let app = app(pool);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            None,
            json!({ "title": "Nope", "description": "nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/tags",
            None,
            json!({ "label": "nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_tag_conflicts() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let (_, token) = create_test_user(&pool, "tags@example.com").await;
    let app = app(pool);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/tags",
            Some(&token),
            json!({ "label": "advanced" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/tags",
            Some(&token),
            json!({ "label": "advanced" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
