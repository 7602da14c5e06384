/// SendGrid sender
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use super::{lookup_trimmed, EmailError, EmailMessage, EmailSender, DEFAULT_FROM_NAME};

pub const PROVIDER: &str = "sendgrid";

/// Default SendGrid API base URL
pub const DEFAULT_API_BASE: &str = "https://api.sendgrid.com";

#[derive(Clone)]
pub struct SendGridConfig {
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
    pub api_base: String,
}

impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl SendGridConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup_trimmed(lookup, "SENDGRID_API_KEY").unwrap_or_default(),
            from_email: lookup_trimmed(lookup, "SENDGRID_FROM_EMAIL").unwrap_or_default(),
            from_name: lookup_trimmed(lookup, "SENDGRID_FROM_NAME")
                .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

pub struct SendGridSender {
    http: Client,
    config: SendGridConfig,
}

impl SendGridSender {
    pub fn new(config: SendGridConfig) -> Result<Self, EmailError> {
        if config.api_key.is_empty() {
            return Err(EmailError::Config("SENDGRID_API_KEY is missing".to_string()));
        }
        if !config.from_email.contains('@') {
            return Err(EmailError::Config(
                "SENDGRID_FROM_EMAIL must be a valid email address".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| EmailError::Request(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn body(&self, message: &EmailMessage) -> serde_json::Value {
        json!({
            "personalizations": [{
                "to": [{"email": message.to_email, "name": message.to_name}]
            }],
            "from": {"email": self.config.from_email, "name": self.config.from_name},
            "subject": message.subject,
            "content": [
                {"type": "text/plain", "value": message.text_body},
                {"type": "text/html", "value": message.html_body}
            ]
        })
    }
}

#[async_trait]
impl EmailSender for SendGridSender {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, message), fields(provider = PROVIDER))]
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.config.api_base.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
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

        debug!(subject = %message.subject, "Email accepted by SendGrid");
        Ok(())
    }
}
