/// Workspace model and database operations
///
/// One row per installed Slack team. Created by the first successful OAuth
/// exchange for a team and updated in place on re-install.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;

const COLUMNS: &str = "id, slack_team_id, slack_team_name, bot_token, bot_user_id, \
                       access_key_used, installed_at, settings";

/// Installed Slack workspace
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Workspace {
    pub id: i64,

    /// Slack team id (`T...`), unique
    pub slack_team_id: String,
    pub slack_team_name: String,

    /// Bot token for the Web API; never serialized
    #[serde(skip_serializing)]
    pub bot_token: String,
    pub bot_user_id: String,

    /// Access key that unlocked the install
    pub access_key_used: String,
    pub installed_at: DateTime<Utc>,

    /// Free-form settings object
    pub settings: JsonValue,
}

/// Result of an OAuth exchange, ready to be persisted
#[derive(Debug, Clone)]
pub struct InstallWorkspace {
    pub slack_team_id: String,

    /// `None` keeps the stored name
    pub slack_team_name: Option<String>,
    pub bot_token: String,
    pub bot_user_id: String,

    /// `None` keeps the stored key
    pub access_key_used: Option<String>,
}

impl Workspace {
    /// Inserts or refreshes the workspace for a Slack team
    ///
    /// A re-install overwrites the bot token and bot user id; the team name
    /// and access key are overwritten only when provided.
    pub async fn upsert_from_install<'e, E>(
        executor: E,
        data: InstallWorkspace,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Workspace>(&format!(
            r#"
            INSERT INTO workspaces (slack_team_id, slack_team_name, bot_token, bot_user_id, access_key_used)
            VALUES ($1, COALESCE($2, ''), $3, $4, COALESCE($5, ''))
            ON CONFLICT (slack_team_id) DO UPDATE
            SET slack_team_name = COALESCE($2, workspaces.slack_team_name),
                bot_token = EXCLUDED.bot_token,
                bot_user_id = EXCLUDED.bot_user_id,
                access_key_used = COALESCE($5, workspaces.access_key_used)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.slack_team_id)
        .bind(data.slack_team_name)
        .bind(data.bot_token)
        .bind(data.bot_user_id)
        .bind(data.access_key_used)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Workspace>(&format!("SELECT {COLUMNS} FROM workspaces WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_team_id<'e, E>(
        executor: E,
        slack_team_id: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {COLUMNS} FROM workspaces WHERE slack_team_id = $1"
        ))
        .bind(slack_team_id)
        .fetch_optional(executor)
        .await
    }

    /// Replaces the settings object
    pub async fn update_settings<'e, E>(
        executor: E,
        id: i64,
        settings: &JsonValue,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Workspace>(&format!(
            "UPDATE workspaces SET settings = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(settings)
        .fetch_optional(executor)
        .await
    }
}
