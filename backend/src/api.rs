use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use shared::{CreateTaskRequest, Task, UpdateTaskRequest};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::TaskStore;

pub fn router(store: TaskStore) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", put(update_task).delete(delete_task))
        .with_state(store)
}

async fn list_tasks(State(store): State<TaskStore>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(store.list().await?))
}

async fn create_task(
    State(store): State<TaskStore>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let task = store.create(payload.title, payload.description).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    Path(id): Path<Uuid>,
    State(store): State<TaskStore>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let task = store.update(id, &payload).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(task))
}

async fn delete_task(
    Path(id): Path<Uuid>,
    State(store): State<TaskStore>,
) -> Result<StatusCode, ApiError> {
    if store.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
