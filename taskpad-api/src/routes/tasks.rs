/// Task endpoints
///
/// Per-user to-do CRUD. Every operation is scoped to the authenticated
/// user; another user's task is indistinguishable from a missing one
/// (404, never 403), so task IDs leak nothing.
///
/// # Endpoints
///
/// - `GET /api/tasks` - List own tasks, newest first
/// - `POST /api/tasks` - Create a task
/// - `PUT /api/tasks/:id` - Update name/state
/// - `DELETE /api/tasks/:id` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskpad_shared::{
    auth::middleware::AuthUser,
    models::task::{CreateTask, Task, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task name
    #[validate(length(
        min = 1,
        max = 120,
        message = "Task name must be between 1 and 120 characters"
    ))]
    pub name: String,
}

/// Update task request (all fields optional)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New task name
    #[validate(length(
        min = 1,
        max = 120,
        message = "Task name must be between 1 and 120 characters"
    ))]
    pub name: Option<String>,

    /// New state label
    #[validate(length(
        min = 1,
        max = 20,
        message = "State must be between 1 and 20 characters"
    ))]
    pub state: Option<String>,
}

/// Lists the authenticated user's tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_for_user(&state.db, auth.user_id).await?;

    Ok(Json(tasks))
}

/// Creates a task
///
/// New tasks start in the "active" state.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: auth.user_id,
            name: req.name,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Updates a task's name and/or state
///
/// # Errors
///
/// - `404 Not Found`: Task does not exist or belongs to another user
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = Task::update_for_user(
        &state.db,
        id,
        auth.user_id,
        UpdateTask {
            name: req.name,
            state: req.state,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task
///
/// # Errors
///
/// - `404 Not Found`: Task does not exist or belongs to another user
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = Task::delete_for_user(&state.db, id, auth.user_id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
