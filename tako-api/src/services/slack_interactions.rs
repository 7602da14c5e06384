/// Slack interaction handling
///
/// `view_submission` from the task modal creates a task and DMs the creator a
/// confirmation with the task buttons. `block_actions` from those buttons
/// records the click in task history; only `complete` changes the task.
/// Outbound Slack calls run in the background and never affect the reply.

use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tako_shared::{
    models::{
        task::{CreateTask, Task, TaskStatus, TaskUpdate},
        task_history::{TaskHistory, ACTION_CREATED},
        workspace::Workspace,
    },
    slack::{
        blocks::task_message_blocks,
        interactions::{BlockAction, InteractionPayload, SubmittedView, TaskSubmission, UserRef},
        SlackClient,
    },
};
use tracing::{debug, info, instrument, warn};

use crate::error::{ApiError, ApiResult};

/// Button action that marks a task done
pub const ACTION_COMPLETE: &str = "complete";

/// Reply for payloads nobody handles
pub fn unhandled() -> JsonValue {
    json!({ "text": "Unhandled interaction" })
}

/// Dispatches a parsed payload for an installed workspace
pub async fn handle(
    db: &PgPool,
    slack: &SlackClient,
    workspace: &Workspace,
    payload: InteractionPayload,
) -> ApiResult<JsonValue> {
    match payload {
        InteractionPayload::ViewSubmission { user, view, .. } if view.is_task_create() => {
            create_from_view(db, slack, workspace, &user, &view).await
        }
        InteractionPayload::BlockActions { user, actions, .. } => match actions.first() {
            Some(action) => apply_action(db, workspace, &user, action).await,
            None => Ok(unhandled()),
        },
        _ => Ok(unhandled()),
    }
}

#[instrument(skip_all, fields(workspace_id = workspace.id, user = %user.id))]
async fn create_from_view(
    db: &PgPool,
    slack: &SlackClient,
    workspace: &Workspace,
    user: &UserRef,
    view: &SubmittedView,
) -> ApiResult<JsonValue> {
    let submission = TaskSubmission::from_view(view)?;

    let mut tx = db.begin().await?;

    let task = Task::create(
        &mut *tx,
        CreateTask {
            title: submission.title,
            description: submission.description,
            assignee_user_id: submission.assignee_user_id,
            creator_user_id: user.id.clone(),
            workspace_id: workspace.id,
            priority: submission.priority,
            status: TaskStatus::Pending,
            due_date: submission.due_date,
            tags: submission.tags,
        },
    )
    .await?;

    TaskHistory::append(
        &mut *tx,
        task.id,
        &user.id,
        ACTION_CREATED,
        &json!({ "source": "slack" }),
    )
    .await?;

    tx.commit().await?;

    info!(task_id = task.id, "Task created from Slack modal");

    notify_created(slack.clone(), workspace.bot_token.clone(), user.id.clone(), task);

    Ok(json!({ "response_action": "clear" }))
}

/// Sends the confirmation DM in the background
fn notify_created(slack: SlackClient, bot_token: String, channel: String, task: Task) {
    tokio::spawn(async move {
        let text = format!("New task created: {}", task.title);
        let blocks = task_message_blocks(&task);

        match slack.post_message(&bot_token, &channel, &text, &blocks).await {
            Ok(_) => debug!(task_id = task.id, "Task confirmation sent"),
            Err(e) => warn!(task_id = task.id, error = %e, "Failed to send task confirmation"),
        }
    });
}

#[instrument(skip_all, fields(workspace_id = workspace.id, user = %user.id))]
async fn apply_action(
    db: &PgPool,
    workspace: &Workspace,
    user: &UserRef,
    action: &BlockAction,
) -> ApiResult<JsonValue> {
    let (value, raw) = action.decode_value()?;

    let mut tx = db.begin().await?;

    let Some(mut task) = Task::find_scoped(&mut *tx, value.task_id, workspace.id).await? else {
        debug!(task_id = value.task_id, "Button click for unknown task");
        return Ok(json!({ "text": "Task not found" }));
    };

    if value.action == ACTION_COMPLETE {
        let update = TaskUpdate {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        task = Task::update(&mut *tx, task.id, workspace.id, &update)
            .await?
            .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    }

    TaskHistory::append(&mut *tx, task.id, &user.id, &value.action, &raw).await?;

    tx.commit().await?;

    info!(task_id = task.id, action = %value.action, "Task action recorded");

    Ok(json!({ "text": format!("Updated task {}", task.title) }))
}
