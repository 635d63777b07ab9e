/// Task CRUD endpoints
///
/// Thin handlers over [`TaskStore`](taskboard_shared::store::TaskStore).
/// Bodies are passed through untouched apart from the `id` field.
///
/// # Endpoints
///
/// | Method | Path              | Success          | Failure    |
/// |--------|-------------------|------------------|------------|
/// | GET    | `/api/tasks`      | 200 `[Task]`     |            |
/// | POST   | `/api/tasks`      | 201 `Task`       | 409        |
/// | GET    | `/api/tasks/:id`  | 200 `Task`       | 404        |
/// | PUT    | `/api/tasks/:id`  | 200 `Task`       | 400, 404   |
/// | DELETE | `/api/tasks/:id`  | 204              | 404        |
///
/// Store outages surface as 502 (503 when throttled). Requests the store
/// rejects as malformed or oversized surface as 400.
///
/// POST and PUT bodies are JSON, or an HTML form post
/// (`application/x-www-form-urlencoded`) whose fields arrive as strings.
///
/// # Example Request
///
/// ```json
/// PUT /api/tasks/t1
/// {
///   "title": "buy milk",
///   "done": true
/// }
/// ```

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::{Map, Value};
use taskboard_shared::models::task::{NewTask, Task};
use tracing::info;

/// Task body accepted by POST and PUT
///
/// Dispatches on `Content-Type`: form-encoded bodies become string fields,
/// everything else goes through axum's `Json` extractor and its rejections.
#[derive(Debug)]
pub struct TaskPayload(pub NewTask);

#[async_trait]
impl<S> FromRequest<S> for TaskPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&request) {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(TaskPayload(task_from_form(pairs)));
        }

        let Json(task) = Json::<NewTask>::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(TaskPayload(task))
    }
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// Builds a task from form pairs; a repeated key keeps its last value
fn task_from_form(pairs: Vec<(String, String)>) -> NewTask {
    let mut id = None;
    let mut fields = Map::new();

    for (key, value) in pairs {
        if key == "id" {
            id = Some(value);
        } else {
            fields.insert(key, Value::String(value));
        }
    }

    NewTask { id, fields }
}

/// Lists every task
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.store.list().await?;
    Ok(Json(tasks))
}

/// Fetches one task by id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", id)))
}

/// Creates a task; the id is generated when the body has none
pub async fn create_task(
    State(state): State<AppState>,
    TaskPayload(payload): TaskPayload,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.store.create(payload).await?;

    info!(task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Replaces a task wholesale
///
/// The body may omit `id`; the path id is used. A body id that disagrees
/// with the path is rejected.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    TaskPayload(payload): TaskPayload,
) -> ApiResult<Json<Task>> {
    let task = task_for_path(id, payload)?;
    let task = state.store.update(task).await?;

    info!(task_id = %task.id, "Task replaced");
    Ok(Json(task))
}

/// Deletes a task
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete(&id).await?;

    info!(task_id = %id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Pins a replacement body to the id from the path
fn task_for_path(id: String, payload: NewTask) -> ApiResult<Task> {
    match payload.id {
        Some(body_id) if !body_id.is_empty() && body_id != id => Err(ApiError::BadRequest(format!(
            "Body id {} does not match path id {}",
            body_id, id
        ))),
        _ => Ok(Task {
            id,
            fields: payload.fields,
        }),
    }
}
