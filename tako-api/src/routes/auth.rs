/// Authentication endpoints
///
/// Every endpoint answers with a bearer token scoped to one workspace.
///
/// # Endpoints
///
/// - `POST /auth/login` - Form login with the Slack team id as username
/// - `POST /auth/slack` - Token for a Slack user of a workspace
/// - `POST /auth/magic-link` - Email a token to an address

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::validate,
};
use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use tako_shared::{
    auth::jwt::{self, Claims, SubjectKind},
    email::EmailMessage,
    models::workspace::Workspace,
};
use tracing::{error, info};
use validator::Validate;

/// OAuth2 password-style login form
///
/// `password` is accepted for client compatibility and ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SlackLoginRequest {
    #[validate(length(min = 1, message = "Slack user id is required"))]
    pub slack_user_id: String,
    pub workspace_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MagicLinkRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub workspace_id: i64,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always `bearer`
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn issue_token(state: &AppState, workspace_id: i64, subject: &str, kind: SubjectKind) -> ApiResult<String> {
    let claims = Claims::new(workspace_id, subject, kind, state.config.jwt_lifetime());
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

/// Workspace login
///
/// ```text
/// POST /auth/login
/// Content-Type: application/x-www-form-urlencoded
///
/// username=T012AB3C4&password=ignored
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: "Workspace not installed"
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    let team_id = form.username.trim();

    let workspace = Workspace::find_by_team_id(&state.db, team_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Workspace not installed".to_string()))?;

    let access_token = issue_token(&state, workspace.id, &workspace.slack_team_id, SubjectKind::Workspace)?;

    info!(workspace_id = workspace.id, "Workspace login");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Slack user login
///
/// # Errors
///
/// - `404 Not Found`: "Workspace not found"
pub async fn slack_login(
    State(state): State<AppState>,
    Json(req): Json<SlackLoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let req = SlackLoginRequest {
        slack_user_id: req.slack_user_id.trim().to_string(),
        ..req
    };
    validate(&req)?;

    let workspace = Workspace::find_by_id(&state.db, req.workspace_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Workspace not found".to_string()))?;

    let access_token = issue_token(&state, workspace.id, &req.slack_user_id, SubjectKind::SlackUser)?;

    info!(workspace_id = workspace.id, "Slack user login");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Emails a sign-in token
///
/// Delivery failures are logged and the request still succeeds.
///
/// # Errors
///
/// - `404 Not Found`: "Workspace not found"
pub async fn magic_link(
    State(state): State<AppState>,
    Json(req): Json<MagicLinkRequest>,
) -> ApiResult<Json<MessageResponse>> {
    validate(&req)?;
    let email = req.email.trim();

    let workspace = Workspace::find_by_id(&state.db, req.workspace_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Workspace not found".to_string()))?;

    let token = issue_token(&state, workspace.id, email, SubjectKind::Email)?;

    let sent = match EmailMessage::magic_link(email, &token) {
        Ok(message) => state.email.send(&message).await,
        Err(e) => Err(e),
    };

    if let Err(e) = sent {
        error!(
            workspace_id = workspace.id,
            provider = state.email.provider(),
            error = %e,
            "Failed to send magic link"
        );
    } else {
        info!(workspace_id = workspace.id, "Magic link sent");
    }

    Ok(Json(MessageResponse {
        message: "Magic link sent".to_string(),
    }))
}
