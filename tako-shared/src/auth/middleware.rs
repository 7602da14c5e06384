/// Request authentication context
///
/// The API's JWT layer validates the bearer token and stores an
/// [`AuthContext`] in the request extensions. Handlers take `AuthContext`
/// as an extractor argument; requests that never went through the layer are
/// rejected with 401.
///
/// # Example
///
/// ```
/// use tako_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("workspace {}", auth.workspace_id)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::jwt::{validate_token, Claims, JwtError, SubjectKind};

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Workspace the request acts on
    pub workspace_id: i64,

    /// Authenticated principal (team id, Slack user id or email)
    pub subject: String,

    /// What `subject` identifies
    pub subject_kind: SubjectKind,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            workspace_id: claims.workspace_id,
            subject: claims.sub,
            subject_kind: claims.sub_kind,
        }
    }

    /// Validates a bearer token from `headers` and builds the context
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Result<Self, AuthError> {
        let token = bearer_token(headers)?;

        let claims = validate_token(token, secret).map_err(|e| match e {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
            _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
        })?;

        Ok(Self::from_claims(claims))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_auth_context_from_headers() {
        let claims = Claims::new(12, "U1", SubjectKind::SlackUser, Duration::minutes(5));
        let token = create_token(&claims, SECRET).unwrap();

        let context = AuthContext::from_headers(&headers_with(&format!("Bearer {}", token)), SECRET)
            .expect("valid token");

        assert_eq!(context.workspace_id, 12);
        assert_eq!(context.subject, "U1");
        assert_eq!(context.subject_kind, SubjectKind::SlackUser);
    }

    #[test]
    fn test_auth_context_rejects_expired() {
        let claims = Claims::new(12, "U1", SubjectKind::SlackUser, Duration::seconds(-60));
        let token = create_token(&claims, SECRET).unwrap();

        let result = AuthContext::from_headers(&headers_with(&format!("Bearer {}", token)), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(msg)) if msg == "Token expired"));
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("x".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidToken("x".to_string()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
