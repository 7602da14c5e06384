/// Task endpoints
///
/// Every operation is scoped to the workspace named by the bearer token. A
/// task of another workspace is reported as not found.
///
/// # Endpoints
///
/// - `GET /tasks` - List with filters and pagination
/// - `POST /tasks` - Create
/// - `GET /tasks/:id` - Task with its history
/// - `PUT /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete (history goes with it)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{current_workspace, validate},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tako_shared::{
    auth::middleware::AuthContext,
    models::{
        task::{CreateTask, Task, TaskFilter, TaskStatus, TaskUpdate},
        task_history::{TaskHistory, ACTION_CREATED, ACTION_UPDATED},
    },
};
use tracing::info;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, message = "Assignee is required"))]
    pub assignee_user_id: String,

    #[validate(length(min = 1, message = "Creator is required"))]
    pub creator_user_id: String,

    /// Must match the token's workspace
    pub workspace_id: i64,

    #[validate(length(min = 1, max = 50, message = "Priority is required"))]
    pub priority: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: String,
}

/// A task with its history, oldest entry first
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub history: Vec<TaskHistory>,
}

/// Lists tasks
///
/// ```text
/// GET /tasks?status=pending&tag=urgent&limit=20
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<Task>>> {
    let workspace = current_workspace(&state.db, &auth).await?;

    let tasks = Task::list(&state.db, workspace.id, &filter).await?;

    Ok(Json(tasks))
}

/// Creates a task and records a `created` history entry
///
/// # Errors
///
/// - `403 Forbidden`: "Invalid workspace" when `workspace_id` is not the token's
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    validate(&req)?;
    let workspace = current_workspace(&state.db, &auth).await?;

    if req.workspace_id != workspace.id {
        return Err(ApiError::Forbidden("Invalid workspace".to_string()));
    }

    let mut tx = state.db.begin().await?;

    let task = Task::create(
        &mut *tx,
        CreateTask {
            title: req.title,
            description: req.description,
            assignee_user_id: req.assignee_user_id,
            creator_user_id: req.creator_user_id,
            workspace_id: workspace.id,
            priority: req.priority,
            status: req.status,
            due_date: req.due_date,
            tags: req.tags,
        },
    )
    .await?;

    TaskHistory::append(
        &mut *tx,
        task.id,
        &task.creator_user_id,
        ACTION_CREATED,
        &json!({ "title": task.title }),
    )
    .await?;

    tx.commit().await?;

    info!(task_id = task.id, workspace_id = workspace.id, "Task created");

    Ok(Json(task))
}

/// Gets a task with its history
///
/// # Errors
///
/// - `404 Not Found`: "Task not found"
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskDetail>> {
    let workspace = current_workspace(&state.db, &auth).await?;

    let task = Task::find_scoped(&state.db, id, workspace.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let history = TaskHistory::list_for_task(&state.db, task.id).await?;

    Ok(Json(TaskDetail { task, history }))
}

/// Applies a partial update
///
/// The history entry is attributed to the workspace bot and its details are
/// exactly the fields present in the request.
///
/// ```text
/// PUT /tasks/42
/// {"status": "done"}
/// ```
///
/// # Errors
///
/// - `404 Not Found`: "Task not found"
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    let workspace = current_workspace(&state.db, &auth).await?;

    if matches!(&update.title, Some(title) if title.trim().is_empty()) {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }

    let mut tx = state.db.begin().await?;

    let task = Task::update(&mut *tx, id, workspace.id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    TaskHistory::append(
        &mut *tx,
        task.id,
        &workspace.bot_user_id,
        ACTION_UPDATED,
        &update.changes(),
    )
    .await?;

    tx.commit().await?;

    info!(
        task_id = task.id,
        workspace_id = workspace.id,
        fields = update.changes().as_object().map_or(0, |o| o.len()),
        "Task updated"
    );

    Ok(Json(task))
}

/// Deletes a task
///
/// # Errors
///
/// - `404 Not Found`: "Task not found"
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let workspace = current_workspace(&state.db, &auth).await?;

    if !Task::delete(&state.db, id, workspace.id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    info!(task_id = id, workspace_id = workspace.id, "Task deleted");

    Ok(Json(json!({ "ok": true })))
}
