/// Access key endpoints
///
/// # Endpoints
///
/// - `POST /request-access` - Issue a key and email it
/// - `POST /verify-key` - Redeem a key for the Slack install URL

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::validate,
    services::access::{self, AccessRequest},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tako_shared::slack::build_install_url;
use validator::Validate;

/// Access request body
#[derive(Debug, Deserialize, Validate)]
pub struct RequestAccessRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 200, message = "Company is required"))]
    pub company: String,

    #[validate(length(min = 1, max = 50, message = "Team size is required"))]
    pub team_size: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestAccessResponse {
    pub message: String,
    pub id: i64,
}

/// Key redemption body
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyKeyRequest {
    #[validate(length(min = 6, message = "Key must be at least 6 characters"))]
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyKeyResponse {
    pub slack_install_url: String,
}

/// Issues an access key
///
/// ```text
/// POST /request-access
/// {"name": "Ada", "email": "ada@example.com", "company": "Engines", "team_size": "1-10"}
/// ```
///
/// Responds `{"message": "Access key issued", "id": 1}` even when the email
/// could not be delivered.
pub async fn request_access(
    State(state): State<AppState>,
    Json(req): Json<RequestAccessRequest>,
) -> ApiResult<Json<RequestAccessResponse>> {
    validate(&req)?;

    let record = access::issue(
        &state.db,
        state.email.as_ref(),
        AccessRequest {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            company: req.company.trim().to_string(),
            team_size: req.team_size.trim().to_string(),
        },
    )
    .await?;

    Ok(Json(RequestAccessResponse {
        message: "Access key issued".to_string(),
        id: record.id,
    }))
}

/// Redeems an access key
///
/// # Errors
///
/// - `400 Bad Request`: "Invalid or used key", whether the key is unknown or
///   already redeemed
pub async fn verify_key(
    State(state): State<AppState>,
    Json(req): Json<VerifyKeyRequest>,
) -> ApiResult<Json<VerifyKeyResponse>> {
    let key = req.key.trim().to_string();
    validate(&VerifyKeyRequest { key: key.clone() })?;

    access::verify(&state.db, &key)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or used key".to_string()))?;

    let install_url = build_install_url(state.slack.config());

    Ok(Json(VerifyKeyResponse {
        slack_install_url: format!("{}&state={}", install_url, key),
    }))
}

