/// Mailjet sender (strict)
///
/// Configuration is validated when the sender is built: missing values,
/// placeholder values copied from an example `.env`, and a from-address
/// without `@` are all rejected, and every problem is reported at once.
/// Nothing is sent until the configuration is fixed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use super::{lookup_trimmed, EmailError, EmailMessage, EmailSender, DEFAULT_FROM_NAME};

pub const PROVIDER: &str = "mailjet";

/// Default Mailjet API base URL
pub const DEFAULT_API_BASE: &str = "https://api.mailjet.com";

const PLACEHOLDERS: [(&str, &[&str]); 3] = [
    ("MAILJET_API_KEY", &["mailjet-key", "your-mailjet-api-key"]),
    ("MAILJET_API_SECRET", &["mailjet-secret", "your-mailjet-api-secret"]),
    (
        "MAILJET_FROM_EMAIL",
        &["noreply@tako-tasks.com", "your-verified-mailjet-sender@example.com"],
    ),
];

#[derive(Clone)]
pub struct MailjetConfig {
    pub api_key: String,
    pub api_secret: String,
    pub from_email: String,
    pub from_name: String,
    pub api_base: String,
}

impl std::fmt::Debug for MailjetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailjetConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl MailjetConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup_trimmed(lookup, "MAILJET_API_KEY").unwrap_or_default(),
            api_secret: lookup_trimmed(lookup, "MAILJET_API_SECRET").unwrap_or_default(),
            from_email: lookup_trimmed(lookup, "MAILJET_FROM_EMAIL").unwrap_or_default(),
            from_name: lookup_trimmed(lookup, "MAILJET_FROM_NAME")
                .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Checks every credential and reports all problems together
    pub fn validate(&self) -> Result<(), EmailError> {
        let errors: Vec<String> = [
            ("MAILJET_API_KEY", self.api_key.as_str()),
            ("MAILJET_API_SECRET", self.api_secret.as_str()),
            ("MAILJET_FROM_EMAIL", self.from_email.as_str()),
        ]
        .into_iter()
        .filter_map(|(name, value)| check_value(name, value))
        .collect();

        if errors.is_empty() {
            return Ok(());
        }

        Err(EmailError::Config(format!(
            "Mailjet configuration invalid: {} Mailjet will not be called until this is fixed.",
            errors.join("; ")
        )))
    }
}

fn check_value(name: &str, value: &str) -> Option<String> {
    if value.is_empty() {
        return Some(format!("{} is missing; set it in your environment (e.g., .env).", name));
    }

    let is_placeholder = PLACEHOLDERS
        .iter()
        .any(|(key, values)| *key == name && values.contains(&value));
    if is_placeholder {
        return Some(format!(
            "{} is still using the placeholder value; replace it with your real Mailjet setting.",
            name
        ));
    }

    if name == "MAILJET_FROM_EMAIL" && !value.contains('@') {
        return Some(
            "MAILJET_FROM_EMAIL must be a valid email address that is verified in Mailjet."
                .to_string(),
        );
    }

    None
}

pub struct MailjetSender {
    http: Client,
    config: MailjetConfig,
}

impl MailjetSender {
    /// Validates `config` and builds the sender
    pub fn new(config: MailjetConfig) -> Result<Self, EmailError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| EmailError::Request(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn body(&self, message: &EmailMessage) -> serde_json::Value {
        json!({
            "Messages": [{
                "From": {"Email": self.config.from_email, "Name": self.config.from_name},
                "To": [{"Email": message.to_email, "Name": message.to_name}],
                "Subject": message.subject,
                "TextPart": message.text_body,
                "HTMLPart": message.html_body,
            }]
        })
    }
}

#[async_trait]
impl EmailSender for MailjetSender {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, message), fields(provider = PROVIDER))]
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .http
            .post(format!("{}/v3.1/send", self.config.api_base.trim_end_matches('/')))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .json(&self.body(message))
            .send()
            .await
            .map_err(|e| EmailError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        debug!(subject = %message.subject, "Email accepted by Mailjet");
        Ok(())
    }
}
