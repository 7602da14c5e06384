/// Slack endpoints
///
/// # Endpoints
///
/// - `GET /slack/install` - 307 to Slack's authorize page
/// - `GET /slack/oauth/callback` - Exchange the code and upsert the workspace
/// - `POST /slack/commands` - Slash commands (signed)
/// - `POST /slack/interactions` - Modal submissions and button clicks (signed)
///
/// Signed endpoints take the raw body, since the signature covers the exact
/// bytes Slack sent.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    services::slack_interactions,
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tako_shared::{
    models::workspace::{InstallWorkspace, Workspace},
    slack::{
        blocks::task_modal,
        build_install_url, extract_payload,
        interactions::InteractionPayload,
        parse_form,
        signature::{verify_request, SIGNATURE_HEADER, TIMESTAMP_HEADER},
        SlackClient, SlackError,
    },
};
use tracing::{debug, info, instrument, warn};

/// Slash command handled by this app
pub const TASK_COMMAND: &str = "/task";

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: String,

    /// The access key that unlocked the install, when present
    #[serde(default)]
    pub state: Option<String>,
}

pub async fn install(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&build_install_url(state.slack.config()))
}

/// Completes the OAuth install
///
/// Re-installing a team overwrites its bot token and bot user id.
///
/// # Errors
///
/// - `400 Bad Request`: Slack rejected the code, or the response lacks the bot token or team
#[instrument(skip(state, params))]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
) -> ApiResult<Json<JsonValue>> {
    let install = state.slack.exchange_code(&params.code).await?.bot_install()?;

    let workspace = Workspace::upsert_from_install(
        &state.db,
        InstallWorkspace {
            slack_team_id: install.team.id.clone(),
            slack_team_name: install.team.name.clone(),
            bot_token: install.bot_token,
            bot_user_id: install.bot_user_id,
            access_key_used: params.state.filter(|s| !s.is_empty()),
        },
    )
    .await?;

    info!(
        workspace_id = workspace.id,
        slack_team_id = %workspace.slack_team_id,
        "Slack workspace installed"
    );

    Ok(Json(json!({ "ok": true, "team": install.team })))
}

/// Checks the Slack signature headers against the raw body
fn verify_signature(state: &AppState, headers: &HeaderMap, body: &[u8]) -> ApiResult<()> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };

    verify_request(
        state.signing_secret(),
        header(TIMESTAMP_HEADER),
        header(SIGNATURE_HEADER),
        body,
    )
    .map_err(|e| {
        warn!(error = %e, "Rejected Slack request");
        ApiError::from(e)
    })
}

async fn workspace_for_team(db: &PgPool, team_id: Option<&str>) -> ApiResult<Workspace> {
    let not_installed = || ApiError::NotFound("Workspace not installed".to_string());

    let team_id = team_id.filter(|t| !t.is_empty()).ok_or_else(not_installed)?;

    Workspace::find_by_team_id(db, team_id)
        .await?
        .ok_or_else(not_installed)
}

fn body_text(body: &Bytes) -> ApiResult<&str> {
    std::str::from_utf8(body)
        .map_err(|_| ApiError::from(SlackError::InvalidPayload("body is not UTF-8".to_string())))
}

/// Handles slash commands
///
/// `/task` or `/task create` opens the creation modal in the background
/// and replies ephemerally.
pub async fn commands(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<JsonValue>> {
    verify_signature(&state, &headers, &body)?;

    let form = parse_form(body_text(&body)?);
    let field = |name: &str| form.get(name).map(|v| v.trim()).unwrap_or_default();

    let workspace = workspace_for_team(&state.db, Some(field("team_id"))).await?;

    let text = field("text");
    if field("command") == TASK_COMMAND && (text.is_empty() || text == "create") {
        open_modal(
            state.slack.clone(),
            workspace.bot_token.clone(),
            field("trigger_id").to_string(),
        );

        return Ok(Json(json!({
            "response_type": "ephemeral",
            "text": "Opening task modal...",
        })));
    }

    debug!(command = %field("command"), text = %text, "Unsupported slash command");

    Ok(Json(json!({ "text": "Unsupported command" })))
}

fn open_modal(slack: SlackClient, bot_token: String, trigger_id: String) {
    tokio::spawn(async move {
        if let Err(e) = slack.open_view(&bot_token, &trigger_id, &task_modal()).await {
            warn!(error = %e, "Failed to open task modal");
        }
    });
}

/// Handles interaction payloads
pub async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<JsonValue>> {
    verify_signature(&state, &headers, &body)?;

    let payload = InteractionPayload::parse(&extract_payload(body_text(&body)?)?)?;

    if matches!(payload, InteractionPayload::Unknown) {
        return Ok(Json(slack_interactions::unhandled()));
    }

    let workspace = workspace_for_team(&state.db, payload.team_id()).await?;

    let reply = slack_interactions::handle(&state.db, &state.slack, &workspace, payload).await?;

    Ok(Json(reply))
}
