/// Authentication utilities
///
/// # Modules
///
/// - [`access_key`]: Single-use access key generation and hashing
/// - [`jwt`]: Bearer token issuing and validation (HS256)
/// - [`middleware`]: Request authentication context and header parsing
///
/// Slack request signature verification lives in [`crate::slack::signature`].
///
/// # Example
///
/// ```
/// use tako_shared::auth::access_key::{generate_access_key, hash_access_key};
/// use tako_shared::auth::jwt::{create_token, validate_token, Claims, SubjectKind};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (key, hash) = generate_access_key();
/// assert_eq!(hash_access_key(&key), hash);
///
/// let claims = Claims::new(7, "T012AB3C4", SubjectKind::Workspace, chrono::Duration::minutes(60));
/// let token = create_token(&claims, "a-secret-that-is-at-least-32-bytes!!")?;
/// assert_eq!(validate_token(&token, "a-secret-that-is-at-least-32-bytes!!")?.workspace_id, 7);
/// # Ok(())
/// # }
/// ```

pub mod access_key;
pub mod jwt;
pub mod middleware;
