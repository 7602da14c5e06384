/// SMTP sender
///
/// Submits directly to a mail relay over STARTTLS with `lettre`.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, instrument};

use super::{lookup_trimmed, EmailError, EmailMessage, EmailSender, DEFAULT_FROM_NAME};

pub const PROVIDER: &str = "smtp";

/// Submission port used when `SMTP_PORT` is unset
pub const DEFAULT_PORT: u16 = 587;

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl SmtpConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, EmailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup_trimmed(lookup, "SMTP_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| EmailError::Config(format!("SMTP_PORT is not a valid port: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: lookup_trimmed(lookup, "SMTP_HOST").unwrap_or_default(),
            port,
            username: lookup_trimmed(lookup, "SMTP_USERNAME").unwrap_or_default(),
            password: lookup("SMTP_PASSWORD").unwrap_or_default(),
            from_email: lookup_trimmed(lookup, "SMTP_FROM_EMAIL").unwrap_or_default(),
            from_name: lookup_trimmed(lookup, "SMTP_FROM_NAME")
                .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
        })
    }
}

pub struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> Result<Self, EmailError> {
        if config.host.is_empty() {
            return Err(EmailError::Config("SMTP_HOST is missing".to_string()));
        }

        let from = mailbox(&config.from_name, &config.from_email)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(config.username, config.password));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        Message::builder()
            .from(self.from.clone())
            .to(mailbox(&message.to_name, &message.to_email)?)
            .subject(message.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            )
            .map_err(|e| EmailError::Transport(e.to_string()))
    }
}

fn mailbox(name: &str, email: &str) -> Result<Mailbox, EmailError> {
    let address = email
        .parse()
        .map_err(|_| EmailError::InvalidAddress(email.to_string()))?;
    let name = Some(name.to_string()).filter(|n| !n.is_empty());
    Ok(Mailbox::new(name, address))
}

#[async_trait]
impl EmailSender for SmtpSender {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, message), fields(provider = PROVIDER))]
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = self.build_message(message)?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        debug!(subject = %message.subject, "Email submitted over SMTP");
        Ok(())
    }
}
