/// Workspace settings endpoints
///
/// Settings are an opaque JSON object owned by the client.
///
/// - `GET /workspace/settings`
/// - `PUT /workspace/settings` - Replace the whole object; echoes it back

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::current_workspace,
};
use axum::{extract::State, Json};
use serde_json::{Map, Value as JsonValue};
use tako_shared::{auth::middleware::AuthContext, models::workspace::Workspace};
use tracing::info;

pub async fn get_settings(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<JsonValue>> {
    let workspace = current_workspace(&state.db, &auth).await?;

    let settings = match workspace.settings {
        JsonValue::Object(map) => JsonValue::Object(map),
        _ => JsonValue::Object(Map::new()),
    };

    Ok(Json(settings))
}

/// Replaces the settings object
///
/// # Errors
///
/// - `400 Bad Request`: The body is JSON but not an object
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(settings): Json<JsonValue>,
) -> ApiResult<Json<JsonValue>> {
    if !settings.is_object() {
        return Err(ApiError::BadRequest("Settings must be a JSON object".to_string()));
    }

    let workspace = current_workspace(&state.db, &auth).await?;

    Workspace::update_settings(&state.db, workspace.id, &settings)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Workspace not found".to_string()))?;

    info!(workspace_id = workspace.id, "Workspace settings replaced");

    Ok(Json(settings))
}
