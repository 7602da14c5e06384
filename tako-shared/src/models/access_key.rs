/// Access key model and database operations
///
/// An access key is requested through the landing page, emailed once in
/// plaintext, and stored only as its SHA-256 digest. It can be verified
/// exactly once.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE access_keys (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     company VARCHAR(255) NOT NULL,
///     team_size VARCHAR(64) NOT NULL,
///     key_hash VARCHAR(64) NOT NULL UNIQUE,
///     is_used BOOLEAN NOT NULL DEFAULT FALSE,
///     issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     used_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tako_shared::auth::access_key::generate_access_key;
/// use tako_shared::models::access_key::{AccessKey, CreateAccessKey};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let (key, key_hash) = generate_access_key();
/// AccessKey::create(&pool, CreateAccessKey {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     company: "Analytical Engines".to_string(),
///     team_size: "1-10".to_string(),
///     key_hash: key_hash.clone(),
/// }).await?;
///
/// assert!(AccessKey::consume(&pool, &key_hash).await?.is_some());
/// assert!(AccessKey::consume(&pool, &key_hash).await?.is_none());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;

const COLUMNS: &str =
    "id, name, email, company, team_size, key_hash, is_used, issued_at, used_at";

/// Access key record
///
/// Serializes without the digest.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AccessKey {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: String,
    pub team_size: String,

    /// SHA-256 hex digest of the plaintext key
    #[serde(skip_serializing)]
    pub key_hash: String,

    /// Once true, never reverts
    pub is_used: bool,
    pub issued_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Input for issuing an access key
#[derive(Debug, Clone)]
pub struct CreateAccessKey {
    pub name: String,
    pub email: String,
    pub company: String,
    pub team_size: String,
    pub key_hash: String,
}

impl AccessKey {
    /// Stores a newly issued key
    ///
    /// # Errors
    ///
    /// Fails on a digest collision (`access_keys_key_hash_key`) or any
    /// database error.
    pub async fn create<'e, E>(executor: E, data: CreateAccessKey) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AccessKey>(&format!(
            r#"
            INSERT INTO access_keys (name, email, company, team_size, key_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.company)
        .bind(data.team_size)
        .bind(data.key_hash)
        .fetch_one(executor)
        .await
    }

    /// Finds a key by digest, used or not
    pub async fn find_by_hash<'e, E>(executor: E, key_hash: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AccessKey>(&format!(
            "SELECT {COLUMNS} FROM access_keys WHERE key_hash = $1"
        ))
        .bind(key_hash)
        .fetch_optional(executor)
        .await
    }

    /// Marks an unused key as used and returns it
    ///
    /// Returns `None` both for unknown digests and for keys already used.
    /// The check and the update are one statement, so concurrent calls with
    /// the same digest yield at most one `Some`.
    pub async fn consume<'e, E>(executor: E, key_hash: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AccessKey>(&format!(
            r#"
            UPDATE access_keys
            SET is_used = TRUE,
                used_at = NOW()
            WHERE key_hash = $1 AND is_used = FALSE
            RETURNING {COLUMNS}
            "#
        ))
        .bind(key_hash)
        .fetch_optional(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_hash() {
        let key = AccessKey {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            company: "Engines".to_string(),
            team_size: "1-10".to_string(),
            key_hash: "deadbeef".to_string(),
            is_used: false,
            issued_at: Utc::now(),
            used_at: None,
        };

        let json = serde_json::to_value(&key).unwrap();
        assert!(json.get("key_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["is_used"], false);
        assert!(json["used_at"].is_null());
    }
}
