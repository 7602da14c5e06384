/// Access key lifecycle
///
/// A key is generated, its digest stored, and the plaintext emailed exactly
/// once. Redeeming a key flips it to used in the same statement that finds
/// it, so a key is good for one successful verification.

use sqlx::PgPool;
use tako_shared::{
    auth::access_key::{generate_access_key, hash_access_key, validate_access_key_format},
    email::{EmailMessage, EmailSender},
    models::access_key::{AccessKey, CreateAccessKey},
};
use tracing::{error, info, instrument, warn};

/// Who is asking for access
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    pub team_size: String,
}

/// Issues a key, stores its digest and emails the plaintext
///
/// Delivery failures are logged; the stored key stays valid.
///
/// # Errors
///
/// Database errors only.
#[instrument(skip(db, email, request), fields(recipient = %request.email))]
pub async fn issue(
    db: &PgPool,
    email: &dyn EmailSender,
    request: AccessRequest,
) -> Result<AccessKey, sqlx::Error> {
    let (key, key_hash) = generate_access_key();

    let record = AccessKey::create(
        db,
        CreateAccessKey {
            name: request.name.clone(),
            email: request.email.clone(),
            company: request.company,
            team_size: request.team_size,
            key_hash,
        },
    )
    .await?;

    info!(access_key_id = record.id, "Access key issued");

    let sent = match EmailMessage::access_key(&request.name, &request.email, &key) {
        Ok(message) => email.send(&message).await,
        Err(e) => Err(e),
    };
    match sent {
        Ok(()) => info!(
            access_key_id = record.id,
            provider = email.provider(),
            "Access key email sent"
        ),
        Err(e) => error!(
            access_key_id = record.id,
            provider = email.provider(),
            error = %e,
            "Failed to send access key email"
        ),
    }

    Ok(record)
}

/// Redeems a key
///
/// Returns `None` for a malformed, unknown or already used key without
/// telling them apart.
#[instrument(skip(db, key))]
pub async fn verify(db: &PgPool, key: &str) -> Result<Option<AccessKey>, sqlx::Error> {
    let key = key.trim();
    if !validate_access_key_format(key) {
        warn!("Rejected malformed access key");
        return Ok(None);
    }

    let record = AccessKey::consume(db, &hash_access_key(key)).await?;

    match &record {
        Some(record) => info!(access_key_id = record.id, "Access key redeemed"),
        None => warn!("Rejected unknown or used access key"),
    }

    Ok(record)
}
