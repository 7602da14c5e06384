/// Task history model
///
/// Append-only audit trail of task mutations. The database rejects updates
/// (`task_history_forbid_update`); rows disappear only with their task.
///
/// Documented `details` keys per action:
///
/// | action | origin | details |
/// |---|---|---|
/// | `created` | REST API | `{"title": ..}` |
/// | `created` | Slack modal | `{"source": "slack"}` |
/// | `updated` | REST API | exactly the fields sent |
/// | button action (`complete`, `status`, ..) | Slack message | the button value `{"action": .., "task_id": ..}` |

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;

pub const ACTION_CREATED: &str = "created";
pub const ACTION_UPDATED: &str = "updated";

const COLUMNS: &str = "id, task_id, user_id, action, details, created_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskHistory {
    pub id: i64,
    pub task_id: i64,

    /// Slack user id of the actor
    pub user_id: String,
    pub action: String,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl TaskHistory {
    /// Appends one entry
    pub async fn append<'e, E>(
        executor: E,
        task_id: i64,
        user_id: &str,
        action: &str,
        details: &JsonValue,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TaskHistory>(&format!(
            r#"
            INSERT INTO task_history (task_id, user_id, action, details)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(action)
        .bind(details)
        .fetch_one(executor)
        .await
    }

    /// A task's history, oldest first
    pub async fn list_for_task<'e, E>(executor: E, task_id: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TaskHistory>(&format!(
            "SELECT {COLUMNS} FROM task_history WHERE task_id = $1 ORDER BY created_at, id"
        ))
        .bind(task_id)
        .fetch_all(executor)
        .await
    }
}
