/// Configuration management for the API server
///
/// Configuration is read once at startup, validated, and then shared through
/// `AppState`. Nothing reads the environment after that.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:8000)
/// - `APP_BASE_URL`: Public base URL, used for the OAuth redirect (default: http://localhost:8000)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: `*`)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `JWT_EXPIRES_MINUTES`: Token lifetime (default: 60, at most one year)
/// - `SLACK_CLIENT_ID` / `SLACK_CLIENT_SECRET` / `SLACK_SIGNING_SECRET`: Slack app credentials (required)
/// - `SLACK_API_BASE`: Slack Web API base (default: https://slack.com/api)
/// - `SLACK_HTTP_TIMEOUT_SECS`: Outbound Slack timeout (default: 10)
/// - `EMAIL_PROVIDER` and the provider's variables, see `tako_shared::email`
/// - `RUST_LOG` / `LOG_FORMAT`: Log filter and `json` output
///
/// # Example
///
/// ```no_run
/// use tako_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::Context;
use tako_shared::email::EmailConfig;
use tako_shared::slack::{client::DEFAULT_API_BASE, SlackConfig};

/// Longest accepted token lifetime (one year)
pub const MAX_JWT_EXPIRES_MINUTES: i64 = 365 * 24 * 60;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub slack: SlackSettings,
    pub email: EmailConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Public base URL without trailing slash
    pub base_url: String,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in minutes
    pub expires_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expires_minutes", &self.expires_minutes)
            .finish()
    }
}

/// Slack app settings
#[derive(Clone)]
pub struct SlackSettings {
    pub client_id: String,
    pub client_secret: String,
    pub signing_secret: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for SlackSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

fn required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// Loads `.env` first when present (development).
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable when a required variable is
    /// missing or a value is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 8000u16)?;
        let base_url = lookup("APP_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8000".to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let production = parse_or(&lookup, "PRODUCTION", false)?;

        let database_url = required(&lookup, "DATABASE_URL")?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = required(&lookup, "JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        let expires_minutes = parse_or(&lookup, "JWT_EXPIRES_MINUTES", 60i64)?;
        if !(1..=MAX_JWT_EXPIRES_MINUTES).contains(&expires_minutes) {
            anyhow::bail!(
                "JWT_EXPIRES_MINUTES must be between 1 and {}",
                MAX_JWT_EXPIRES_MINUTES
            );
        }

        let slack = SlackSettings {
            client_id: required(&lookup, "SLACK_CLIENT_ID")?,
            client_secret: required(&lookup, "SLACK_CLIENT_SECRET")?,
            signing_secret: required(&lookup, "SLACK_SIGNING_SECRET")?,
            api_base: lookup("SLACK_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout_secs: parse_or(&lookup, "SLACK_HTTP_TIMEOUT_SECS", 10u64)?,
        };

        let email = EmailConfig::from_lookup(&lookup).context("invalid email configuration")?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                base_url,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_minutes,
            },
            slack,
            email,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Slack app configuration with the redirect derived from `APP_BASE_URL`
    pub fn slack_config(&self) -> SlackConfig {
        SlackConfig::new(
            self.slack.client_id.clone(),
            self.slack.client_secret.clone(),
            self.slack.signing_secret.clone(),
            &self.api.base_url,
        )
    }

    pub fn slack_timeout(&self) -> Duration {
        Duration::from_secs(self.slack.timeout_secs)
    }

    pub fn jwt_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.jwt.expires_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgresql://localhost/tako_test"),
            ("JWT_SECRET", SECRET),
            ("SLACK_CLIENT_ID", "123.456"),
            ("SLACK_CLIENT_SECRET", "client-secret"),
            ("SLACK_SIGNING_SECRET", "signing-secret"),
            ("EMAIL_PROVIDER", "smtp"),
            ("SMTP_HOST", "smtp.acme.test"),
            ("MAILJET_API_KEY", "k"),
            ("SENDGRID_API_KEY", "k"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> anyhow::Result<Config> {
        let mut vars = vars.clone();
        // pick whichever provider this build includes
        let provider = tako_shared::email::compiled_providers()[0];
        vars.insert("EMAIL_PROVIDER", provider);
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.production);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expires_minutes, 60);
        assert_eq!(config.slack.api_base, "https://slack.com/api");
        assert_eq!(config.slack_timeout(), Duration::from_secs(10));
        assert_eq!(config.jwt_lifetime(), chrono::Duration::minutes(60));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("API_PORT", "9000");
        vars.insert("APP_BASE_URL", "https://tako.example.com/");
        vars.insert("CORS_ORIGINS", "https://a.example.com, https://b.example.com");
        vars.insert("PRODUCTION", "true");
        vars.insert("JWT_EXPIRES_MINUTES", "15");

        let config = load(&vars).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.base_url, "https://tako.example.com");
        assert_eq!(config.api.cors_origins.len(), 2);
        assert!(config.api.production);
        assert_eq!(config.jwt.expires_minutes, 15);
        assert_eq!(
            config.slack_config().redirect_uri,
            "https://tako.example.com/slack/oauth/callback"
        );
    }

    #[test]
    fn test_missing_required_variable_is_named() {
        for key in ["DATABASE_URL", "JWT_SECRET", "SLACK_CLIENT_ID", "SLACK_SIGNING_SECRET"] {
            let mut vars = base_vars();
            vars.remove(key);
            let err = load(&vars).unwrap_err().to_string();
            assert!(err.contains(key), "error for {} was: {}", key, err);
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut vars = base_vars();
        vars.insert("JWT_SECRET", "short");
        assert!(load(&vars).is_err());

        let mut vars = base_vars();
        vars.insert("JWT_EXPIRES_MINUTES", "0");
        assert!(load(&vars).is_err());

        let mut vars = base_vars();
        vars.insert("JWT_EXPIRES_MINUTES", "9223372036854775807");
        let err = load(&vars).unwrap_err().to_string();
        assert!(err.contains("JWT_EXPIRES_MINUTES"));

        let mut vars = base_vars();
        vars.insert("API_PORT", "eighty");
        let err = load(&vars).unwrap_err().to_string();
        assert!(err.contains("API_PORT"));
    }

    #[test]
    fn test_longest_token_lifetime_accepted() {
        let mut vars = base_vars();
        vars.insert("JWT_EXPIRES_MINUTES", "525600");
        let config = load(&vars).unwrap();

        assert_eq!(config.jwt_lifetime(), chrono::Duration::minutes(MAX_JWT_EXPIRES_MINUTES));
        let claims = tako_shared::auth::jwt::Claims::new(
            1,
            "T1",
            tako_shared::auth::jwt::SubjectKind::Workspace,
            config.jwt_lifetime(),
        );
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_vars()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains(SECRET));
        assert!(!debug.contains("signing-secret"));
        assert!(!debug.contains("client-secret"));
    }
}
