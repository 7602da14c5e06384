/// Task model and database operations
///
/// Tasks belong to exactly one workspace and every query here is scoped by
/// workspace id. Deleting a task removes its history through the foreign key
/// cascade.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'blocked', 'review', 'done');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     assignee_user_id VARCHAR(64) NOT NULL,
///     creator_user_id VARCHAR(64) NOT NULL,
///     workspace_id BIGINT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
///     priority VARCHAR(64) NOT NULL DEFAULT 'normal',
///     status task_status NOT NULL DEFAULT 'pending',
///     due_date TIMESTAMPTZ,
///     tags TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tako_shared::models::task::{Task, TaskFilter, TaskUpdate, TaskStatus};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let urgent = Task::list(&pool, 1, &TaskFilter {
///     tag: Some("urgent".to_string()),
///     ..TaskFilter::default()
/// }).await?;
///
/// for task in urgent {
///     let done = TaskUpdate { status: Some(TaskStatus::Done), ..TaskUpdate::default() };
///     Task::update(&pool, task.id, 1, &done).await?;
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgExecutor, Postgres, QueryBuilder};

const COLUMNS: &str = "id, title, description, assignee_user_id, creator_user_id, workspace_id, \
                       priority, status, due_date, tags, created_at, updated_at";

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Largest page size a listing may request
pub const MAX_LIST_LIMIT: i64 = 500;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Blocked,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Slack user id of the assignee
    pub assignee_user_id: String,

    /// Slack user id of the creator
    pub creator_user_id: String,
    pub workspace_id: i64,

    /// Free-form priority label (`low`, `normal`, `high`, `urgent` from Slack)
    pub priority: String,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,

    /// Comma separated tags
    pub tags: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub assignee_user_id: String,
    pub creator_user_id: String,
    pub workspace_id: i64,
    pub priority: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: String,
}

/// Partial update
///
/// Absent fields are left untouched and are not serialized, so the
/// serialized form is exactly the set of changes. `due_date` distinguishes
/// absent (`None`) from an explicit `null` (`Some(None)`), which clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskUpdate {
    /// The fields present in this update, as a JSON object
    pub fn changes(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }
}

/// Listing filters; every field narrows the result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,

    /// Tasks due on or before this instant
    pub due_date: Option<DateTime<Utc>>,

    /// Case-insensitive substring of `tags`
    pub tag: Option<String>,

    /// Case-insensitive substring of `title`
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TaskFilter {
    /// Page size, clamped to `1..=MAX_LIST_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Builds an ILIKE pattern matching `needle` anywhere, with `\`, `%` and `_`
/// taken literally
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Task {
    /// Inserts a task
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, assignee_user_id, creator_user_id,
                               workspace_id, priority, status, due_date, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.assignee_user_id)
        .bind(data.creator_user_id)
        .bind(data.workspace_id)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.due_date)
        .bind(data.tags)
        .fetch_one(executor)
        .await
    }

    /// Finds a task within a workspace
    ///
    /// A task of another workspace is reported as absent.
    pub async fn find_scoped<'e, E>(
        executor: E,
        id: i64,
        workspace_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE id = $1 AND workspace_id = $2"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a workspace's tasks, newest first
    pub async fn list<'e, E>(
        executor: E,
        workspace_id: i64,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM tasks WHERE workspace_id = "));
        query.push_bind(workspace_id);

        if let Some(assignee) = non_empty(&filter.assignee) {
            query.push(" AND assignee_user_id = ").push_bind(assignee.to_string());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = non_empty(&filter.priority) {
            query.push(" AND priority = ").push_bind(priority.to_string());
        }
        if let Some(due_date) = filter.due_date {
            query.push(" AND due_date <= ").push_bind(due_date);
        }
        if let Some(tag) = non_empty(&filter.tag) {
            query.push(" AND tags ILIKE ").push_bind(like_pattern(tag));
        }
        if let Some(search) = non_empty(&filter.search) {
            query.push(" AND title ILIKE ").push_bind(like_pattern(search));
        }

        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit())
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let tasks = query.build_query_as::<Task>().fetch_all(executor).await?;
        Ok(tasks)
    }

    /// Applies a partial update within a workspace
    ///
    /// Always bumps `updated_at`. Returns `None` when the task does not exist
    /// in that workspace.
    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        workspace_id: i64,
        update: &TaskUpdate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = &update.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &update.description {
            query.push(", description = ").push_bind(description.clone());
        }
        if let Some(assignee) = &update.assignee_user_id {
            query.push(", assignee_user_id = ").push_bind(assignee.clone());
        }
        if let Some(priority) = &update.priority {
            query.push(", priority = ").push_bind(priority.clone());
        }
        if let Some(status) = update.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(due_date) = update.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(tags) = &update.tags {
            query.push(", tags = ").push_bind(tags.clone());
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND workspace_id = ")
            .push_bind(workspace_id)
            .push(format!(" RETURNING {COLUMNS}"));

        let task = query.build_query_as::<Task>().fetch_optional(executor).await?;
        Ok(task)
    }

    /// Deletes a task within a workspace; `false` if there was none
    pub async fn delete<'e, E>(executor: E, id: i64, workspace_id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND workspace_id = $2")
            .bind(id)
            .bind(workspace_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
