/// JWT token generation and validation
///
/// Bearer tokens carry the identity of a workspace plus the principal that
/// authenticated (the Slack team itself, a Slack user, or an email address
/// that received a magic link).
///
/// # Security
///
/// - **Algorithm**: HS256
/// - **Expiration**: configured per deployment (`JWT_EXPIRES_MINUTES`)
/// - **Validation**: signature, expiration, not-before and issuer
///
/// # Example
///
/// ```
/// use tako_shared::auth::jwt::{create_token, validate_token, Claims, SubjectKind};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let claims = Claims::new(42, "U024BE7LH", SubjectKind::SlackUser, Duration::minutes(60));
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.workspace_id, 42);
/// assert_eq!(validated.sub, "U024BE7LH");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer written into and required from every token
pub const ISSUER: &str = "tako-tasks";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Issuer does not match
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Who the token was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Workspace login by Slack team id; `sub` is the team id
    Workspace,

    /// Slack user login; `sub` is the Slack user id
    SlackUser,

    /// Magic-link login; `sub` is the email address
    Email,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - team id, Slack user id or email depending on `sub_kind`
    pub sub: String,

    /// What `sub` identifies
    pub sub_kind: SubjectKind,

    /// Workspace the bearer may act on
    pub workspace_id: i64,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims valid from now for `expires_in`
    pub fn new(
        workspace_id: i64,
        subject: impl Into<String>,
        sub_kind: SubjectKind,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            sub_kind,
            workspace_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact JWT
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// # Errors
///
/// - [`JwtError::Expired`] when `exp` is in the past
/// - [`JwtError::InvalidIssuer`] when the token was not issued by this service
/// - [`JwtError::ValidationError`] for bad signatures and malformed tokens
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
