/// Transactional email
///
/// One capability, "send a single templated message to one recipient", with
/// an implementation per provider. Each provider sits behind a Cargo feature
/// (`mailjet`, `sendgrid`, `smtp`) so a deployment only compiles the ones it
/// uses; `EMAIL_PROVIDER` picks among the compiled ones at startup.
///
/// # Example
///
/// ```
/// use tako_shared::email::EmailMessage;
///
/// let message = EmailMessage::access_key("Ada", "ada@example.com", "KEY-1A2B3C-TK").unwrap();
/// assert_eq!(message.subject, "Your Tako Tasks access key");
/// assert!(message.text_body.contains("KEY-1A2B3C-TK"));
/// ```

#[cfg(not(any(feature = "mailjet", feature = "sendgrid", feature = "smtp")))]
compile_error!("enable at least one email provider feature: mailjet, sendgrid or smtp");

#[cfg(feature = "mailjet")]
pub mod mailjet;
#[cfg(feature = "sendgrid")]
pub mod sendgrid;
#[cfg(feature = "smtp")]
pub mod smtp;

use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;
use thiserror::Error;

/// Sender name used when none is configured
pub const DEFAULT_FROM_NAME: &str = "Tako Tasks";

/// Error type for email delivery
#[derive(Debug, Error)]
pub enum EmailError {
    /// Provider configuration is missing or still holds placeholders
    #[error("{0}")]
    Config(String),

    /// `EMAIL_PROVIDER` names a provider this build does not include
    #[error("Email provider '{0}' is not available in this build (compiled: {1})")]
    UnknownProvider(String, String),

    /// Recipient or sender address is not valid
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// HTTP request to the provider failed
    #[error("Email request failed: {0}")]
    Request(String),

    /// Provider rejected the message
    #[error("Email provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// Mail transport failure
    #[error("Email transport error: {0}")]
    Transport(String),

    /// Template rendering failure
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A single message to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// HTML body of the access key email
#[derive(Template)]
#[template(path = "email/access_key.html")]
struct AccessKeyEmailHtml<'a> {
    name: &'a str,
    key: &'a str,
}

/// Plain text body of the access key email
#[derive(Template)]
#[template(path = "email/access_key.txt")]
struct AccessKeyEmailText<'a> {
    name: &'a str,
    key: &'a str,
}

/// HTML body of the magic link email
#[derive(Template)]
#[template(path = "email/magic_link.html")]
struct MagicLinkEmailHtml<'a> {
    name: &'a str,
    token: &'a str,
}

/// Plain text body of the magic link email
#[derive(Template)]
#[template(path = "email/magic_link.txt")]
struct MagicLinkEmailText<'a> {
    name: &'a str,
    token: &'a str,
}

impl EmailMessage {
    /// The email carrying a freshly issued access key
    pub fn access_key(name: &str, email: &str, key: &str) -> Result<Self, EmailError> {
        Ok(Self {
            to_email: email.to_string(),
            to_name: name.to_string(),
            subject: "Your Tako Tasks access key".to_string(),
            html_body: AccessKeyEmailHtml { name, key }.render()?,
            text_body: AccessKeyEmailText { name, key }.render()?,
        })
    }

    /// The email carrying a magic login token
    ///
    /// The recipient name is the local part of the address.
    pub fn magic_link(email: &str, token: &str) -> Result<Self, EmailError> {
        let name = email.split('@').next().unwrap_or(email);

        Ok(Self {
            to_email: email.to_string(),
            to_name: name.to_string(),
            subject: "Your Tako Tasks sign-in link".to_string(),
            html_body: MagicLinkEmailHtml { name, token }.render()?,
            text_body: MagicLinkEmailText { name, token }.render()?,
        })
    }
}

/// Sends one message through a provider
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Provider name, for logs
    fn provider(&self) -> &'static str;

    /// Delivers `message`
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Provider selection plus that provider's settings
#[derive(Debug, Clone)]
pub enum EmailConfig {
    #[cfg(feature = "mailjet")]
    Mailjet(mailjet::MailjetConfig),
    #[cfg(feature = "sendgrid")]
    SendGrid(sendgrid::SendGridConfig),
    #[cfg(feature = "smtp")]
    Smtp(smtp::SmtpConfig),
}

/// Providers compiled into this build, in preference order
pub fn compiled_providers() -> Vec<&'static str> {
    let mut providers = Vec::new();
    #[cfg(feature = "mailjet")]
    providers.push("mailjet");
    #[cfg(feature = "sendgrid")]
    providers.push("sendgrid");
    #[cfg(feature = "smtp")]
    providers.push("smtp");
    providers
}

impl EmailConfig {
    /// Reads provider settings through `lookup` (normally `std::env::var`)
    ///
    /// `EMAIL_PROVIDER` selects the provider; when unset the first compiled
    /// provider is used.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EmailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let compiled = compiled_providers();
        let provider = lookup("EMAIL_PROVIDER")
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .or_else(|| compiled.first().map(|p| p.to_string()))
            .unwrap_or_default();

        match provider.as_str() {
            #[cfg(feature = "mailjet")]
            "mailjet" => Ok(Self::Mailjet(mailjet::MailjetConfig::from_lookup(&lookup))),
            #[cfg(feature = "sendgrid")]
            "sendgrid" => Ok(Self::SendGrid(sendgrid::SendGridConfig::from_lookup(&lookup))),
            #[cfg(feature = "smtp")]
            "smtp" => Ok(Self::Smtp(smtp::SmtpConfig::from_lookup(&lookup)?)),
            other => Err(EmailError::UnknownProvider(
                other.to_string(),
                compiled.join(", "),
            )),
        }
    }

    /// Name of the selected provider
    pub fn provider(&self) -> &'static str {
        match self {
            #[cfg(feature = "mailjet")]
            Self::Mailjet(_) => mailjet::PROVIDER,
            #[cfg(feature = "sendgrid")]
            Self::SendGrid(_) => sendgrid::PROVIDER,
            #[cfg(feature = "smtp")]
            Self::Smtp(_) => smtp::PROVIDER,
        }
    }

    /// Builds the sender, validating the provider settings
    pub fn build_sender(&self) -> Result<Arc<dyn EmailSender>, EmailError> {
        let sender: Arc<dyn EmailSender> = match self {
            #[cfg(feature = "mailjet")]
            Self::Mailjet(config) => Arc::new(mailjet::MailjetSender::new(config.clone())?),
            #[cfg(feature = "sendgrid")]
            Self::SendGrid(config) => Arc::new(sendgrid::SendGridSender::new(config.clone())?),
            #[cfg(feature = "smtp")]
            Self::Smtp(config) => Arc::new(smtp::SmtpSender::new(config.clone())?),
        };
        Ok(sender)
    }
}

/// Reads a trimmed value; empty counts as unset
pub(crate) fn lookup_trimmed<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
