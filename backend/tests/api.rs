use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use backend::{api, store::TaskStore};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    let store = TaskStore::connect_with("sqlite::memory:", 1)
        .await
        .expect("in-memory store");
    api::router(store)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_toggle_delete_roundtrip() {
    let app = test_app().await;

    // Create
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/tasks",
            json!({"title": "Buy milk"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["completed"], json!(false));
    assert_eq!(created["createdAt"], created["updatedAt"]);
    let id = created["id"].as_str().unwrap().to_string();

    // Toggle completed only
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/tasks/{id}"),
            json!({"completed": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["completed"], json!(true));
    assert_eq!(updated["title"], json!("Buy milk"));

    // Delete
    let response = app
        .clone()
        .oneshot(empty_request(Method::DELETE, &format!("/api/tasks/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone from the list
    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/api/tasks"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tasks = json_body(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_without_title_is_rejected_and_nothing_inserted() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/tasks", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], json!("Title is required"));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/tasks",
            json!({"title": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(empty_request(Method::GET, "/api/tasks"))
        .await
        .unwrap();
    let tasks = json_body(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn partial_update_preserves_unmentioned_fields() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/tasks",
            json!({"title": "Buy milk", "description": "2 liters"}),
        ))
        .await
        .unwrap();
    let created = json_body(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/tasks/{id}"),
            json!({"completed": true}),
        ))
        .await
        .unwrap();
    let updated = json_body(response).await;

    assert_eq!(updated["title"], json!("Buy milk"));
    assert_eq!(updated["description"], json!("2 liters"));
    assert_eq!(updated["completed"], json!(true));
    assert!(updated["updatedAt"].as_str().unwrap() >= updated["createdAt"].as_str().unwrap());
}

#[tokio::test]
async fn update_unknown_id_returns_404() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/api/tasks/00000000-0000-4000-8000-000000000000",
            json!({"completed": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_id_returns_404() {
    let app = test_app().await;

    let response = app
        .oneshot(empty_request(
            Method::DELETE,
            "/api/tasks/00000000-0000-4000-8000-000000000000",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_tasks_newest_first() {
    let app = test_app().await;

    for title in ["first", "second", "third"] {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/tasks",
                json!({"title": title}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = app
        .oneshot(empty_request(Method::GET, "/api/tasks"))
        .await
        .unwrap();
    let tasks = json_body(response).await;
    let titles: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["third", "second", "first"]);
}
