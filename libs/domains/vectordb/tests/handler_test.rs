//! Handler tests for the vector database domain
//!
//! These drive the `/v2/vectordb` router with in-memory stores and check:
//! - Request deserialization of the client wire format
//! - The `{"code": 0, "data": ...}` envelope
//! - HTTP status codes and error bodies

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_vectordb::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use test_utils::TestDataBuilder;
use tower::ServiceExt; // For oneshot()

const ROOT_TOKEN: &str = "root:Orenco";

fn app() -> Router {
    let service = VectorDbService::with_hasher(
        InMemoryCredentialStore::new(),
        InMemoryVectorStore::new(),
        &VectorDbConfig::new("root", "Orenco"),
        SecretHasher::insecure_fast(),
    )
    .unwrap();
    handlers::router(service)
}

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post(app: &Router, path: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v2/vectordb{path}"))
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, json_body(response.into_body()).await)
}

async fn create_user(app: &Router, name: &str, password: &str) {
    let (status, body) = post(
        app,
        "/users/create",
        ROOT_TOKEN,
        Some(json!({"userName": name, "password": password, "pubKey": "pk-xxxxxxxxxxxxxxxxxxxxx"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["code"], 0);
}

#[tokio::test]
async fn test_client_workflow() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("client_workflow");
    let user = builder.name("tenant", "test");
    let token = format!("{user}:Orenco");

    create_user(&app, &user, "Orenco").await;

    // Duplicate user
    let (status, _) = post(
        &app,
        "/users/create",
        ROOT_TOKEN,
        Some(json!({"userName": user, "password": "Orenco", "pubKey": "pk"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // List users without a body
    let (status, body) = post(&app, "/users/list", ROOT_TOKEN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([user]));

    let (status, body) = post(
        &app,
        "/collections/create",
        &token,
        Some(json!({"name": "test_collection", "dimension": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["metricType"], "L2");

    // List tolerates an unrelated body
    let (status, body) = post(
        &app,
        "/collections/list",
        &token,
        Some(json!({"dbName": "test_collection"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "test_collection");

    let (status, body) = post(
        &app,
        "/entities/insert",
        &token,
        Some(json!({
            "collectionName": "test_collection",
            "data": [
                {"id": 1, "vector": [0.1, 0.2, 0.3, 0.4, 0.5], "metadata": {"color": "red"}},
                {"id": 2, "vector": [0.2, 0.3, 0.4, 0.5, 0.6], "metadata": {"color": "blue"}}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["insertCount"], 2);
    assert_eq!(body["data"]["insertIds"], json!([1, 2]));

    let (status, body) = post(
        &app,
        "/entities/search",
        &token,
        Some(json!({
            "collectionName": "test_collection",
            "data": [[0.1, 0.2, 0.3, 0.4, 0.5]],
            "limit": 2,
            "annsField": "vector",
            "outputFields": ["color"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    let hits = body["data"][0].as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0], json!({"id": 1, "distance": 0.0, "color": "red"}));
    assert_eq!(hits[1]["id"], 2);

    let (status, body) = post(
        &app,
        "/collections/describe",
        &token,
        Some(json!({"collectionName": "test_collection"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entityCount"], 2);
    assert_eq!(body["data"]["dimension"], 5);

    let (status, body) = post(
        &app,
        "/collections/drop",
        &token,
        Some(json!({"name": "test_collection"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);

    let (status, _) = post(
        &app,
        "/users/drop",
        ROOT_TOKEN,
        Some(json!({"userName": user})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unauthorized_access() {
    let app = app();

    let (status, body) = post(
        &app,
        "/collections/list",
        "invalid:token",
        Some(json!({"dbName": "_default"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    // No Authorization header at all
    let request = Request::builder()
        .method("POST")
        .uri("/v2/vectordb/collections/list")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let app = app();
    create_user(&app, "t1", "p").await;

    let (status, _) = post(&app, "/collections/list", "t1:p", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/collections/list", "t1:wrong", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_drop_not_existent_user() {
    let app = app();

    let (status, body) = post(
        &app,
        "/users/drop",
        ROOT_TOKEN,
        Some(json!({"userName": "non-existent-user"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    assert_eq!(body["detail"], "User not found");
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_tenant_cannot_administer_users() {
    let app = app();
    create_user(&app, "t1", "p").await;

    let (status, body) = post(&app, "/users/list", "t1:p", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_collections_are_isolated_per_tenant() {
    let app = app();
    create_user(&app, "t1", "p").await;
    create_user(&app, "t2", "p").await;

    let create = json!({"name": "shared", "dimension": 2});
    let (status, _) = post(&app, "/collections/create", "t1:p", Some(create.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(&app, "/collections/list", "t2:p", None).await;
    assert_eq!(body["data"], json!([]));

    let (status, _) = post(
        &app,
        "/collections/describe",
        "t2:p",
        Some(json!({"name": "shared"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&app, "/collections/create", "t2:p", Some(create)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_dimension_mismatch_rejects_batch() {
    let app = app();
    let (status, _) = post(
        &app,
        "/collections/create",
        ROOT_TOKEN,
        Some(json!({"name": "docs", "dimension": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &app,
        "/entities/insert",
        ROOT_TOKEN,
        Some(json!({
            "collectionName": "docs",
            "data": [
                {"id": 1, "vector": [0.1, 0.2, 0.3]},
                {"id": 2, "vector": [0.1, 0.2]}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "DIMENSION_MISMATCH");

    let (_, body) = post(
        &app,
        "/collections/describe",
        ROOT_TOKEN,
        Some(json!({"name": "docs"})),
    )
    .await;
    assert_eq!(body["data"]["entityCount"], 0);
}

#[tokio::test]
async fn test_get_and_delete_entities() {
    let app = app();
    post(
        &app,
        "/collections/create",
        ROOT_TOKEN,
        Some(json!({"name": "docs", "dimension": 2, "metricType": "COSINE"})),
    )
    .await;
    post(
        &app,
        "/entities/insert",
        ROOT_TOKEN,
        Some(json!({
            "collectionName": "docs",
            "data": [
                {"vector": [1.0, 0.0], "metadata": {"color": "red", "size": 3}},
                {"vector": [0.0, 1.0], "color": "blue"}
            ]
        })),
    )
    .await;

    let (status, body) = post(
        &app,
        "/entities/get",
        ROOT_TOKEN,
        Some(json!({"collectionName": "docs", "ids": [2, 1, 9], "outputFields": ["color"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([
            {"id": 1, "vector": [1.0, 0.0], "color": "red"},
            {"id": 2, "vector": [0.0, 1.0], "color": "blue"}
        ])
    );

    let (status, body) = post(
        &app,
        "/entities/delete",
        ROOT_TOKEN,
        Some(json!({"collectionName": "docs", "ids": [1, 9]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleteCount"], 1);

    // Cosine similarity, larger first
    let (_, body) = post(
        &app,
        "/entities/search",
        ROOT_TOKEN,
        Some(json!({"collectionName": "docs", "data": [[0.0, 2.0]], "limit": 5})),
    )
    .await;
    assert_eq!(body["data"], json!([[{"id": 2, "distance": 1.0}]]));
}

#[tokio::test]
async fn test_invalid_requests_are_bad_request() {
    let app = app();
    post(
        &app,
        "/collections/create",
        ROOT_TOKEN,
        Some(json!({"name": "docs", "dimension": 2})),
    )
    .await;

    let cases = [
        ("/collections/create", json!({"name": "bad", "dimension": 0})),
        ("/collections/create", json!({"name": "", "dimension": 2})),
        ("/collections/create", json!({"name": "docs", "dimension": 2})),
        ("/entities/insert", json!({"collectionName": "docs", "data": []})),
        (
            "/entities/search",
            json!({"collectionName": "docs", "data": [[0.0, 0.0]], "limit": 0}),
        ),
        (
            "/entities/search",
            json!({"collectionName": "docs", "data": [[0.0, 0.0]], "limit": 1, "annsField": "other"}),
        ),
        ("/entities/search", json!({"collectionName": "docs"})),
    ];
    for (path, body) in cases {
        let (status, response) = post(&app, path, ROOT_TOKEN, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path} {body} -> {response}");
        assert_ne!(response["code"], 0);
    }

    let (status, _) = post(
        &app,
        "/entities/search",
        ROOT_TOKEN,
        Some(json!({"collectionName": "missing", "data": [[0.0, 0.0]], "limit": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
