/// Database models for Tako Tasks
///
/// Every operation takes any Postgres executor: a pool for standalone calls
/// or `&mut *tx` to take part in a transaction.
///
/// # Models
///
/// - `access_key`: Single-use access keys (stored as digests)
/// - `workspace`: Installed Slack teams and their bot credentials
/// - `task`: Workspace-scoped tasks with filtering and partial updates
/// - `task_history`: Append-only audit trail of task mutations
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use tako_shared::models::task::{CreateTask, Task, TaskStatus};
/// use tako_shared::models::task_history::{TaskHistory, ACTION_CREATED};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
///
/// let task = Task::create(&mut *tx, CreateTask {
///     title: "Write release notes".to_string(),
///     description: "For 1.2".to_string(),
///     assignee_user_id: "U024BE7LH".to_string(),
///     creator_user_id: "U024BE7LH".to_string(),
///     workspace_id: 1,
///     priority: "normal".to_string(),
///     status: TaskStatus::Pending,
///     due_date: None,
///     tags: "docs".to_string(),
/// }).await?;
/// TaskHistory::append(&mut *tx, task.id, &task.creator_user_id, ACTION_CREATED, &json!({"title": task.title})).await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod access_key;
pub mod task;
pub mod task_history;
pub mod workspace;
