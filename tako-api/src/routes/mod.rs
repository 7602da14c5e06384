/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Service banner and health check
/// - `access`: Access key requests and redemption
/// - `auth`: Bearer token issuing
/// - `slack`: Install flow, slash commands and interactions
/// - `tasks`: Task CRUD
/// - `workspace`: Workspace settings

pub mod access;
pub mod auth;
pub mod health;
pub mod slack;
pub mod tasks;
pub mod workspace;

use crate::error::{ApiError, ApiResult};
use sqlx::PgPool;
use tako_shared::{auth::middleware::AuthContext, models::workspace::Workspace};
use validator::Validate;

/// Loads the workspace named by the bearer token
///
/// A token for a workspace that no longer exists is rejected as 401.
pub(crate) async fn current_workspace(db: &PgPool, auth: &AuthContext) -> ApiResult<Workspace> {
    Workspace::find_by_id(db, auth.workspace_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Workspace not found".to_string()))
}

/// Runs `validator` rules, mapping failures to 422
pub(crate) fn validate<T: Validate>(input: &T) -> ApiResult<()> {
    input.validate().map_err(ApiError::from)
}
