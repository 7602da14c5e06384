/// Slack Web API client
///
/// Covers the three calls Tako Tasks makes: the OAuth v2 code exchange,
/// `views.open` for the task modal and `chat.postMessage` for task
/// notifications. Every response is checked for `ok`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::blocks::{Block, View};
use super::error::SlackError;
use super::SlackConfig;

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Default timeout for outbound Slack calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack API client.
#[derive(Clone)]
pub struct SlackClient {
    http: Client,
    api_base: String,
    config: Arc<SlackConfig>,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("api_base", &self.api_base)
            .field("client_id", &self.config.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

/// Response of `oauth.v2.access`.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthAccessResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub bot_user_id: Option<String>,
    #[serde(default)]
    pub team: Option<TeamDescriptor>,
    /// Legacy install shape
    #[serde(default)]
    pub bot: Option<LegacyBot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBot {
    #[serde(default)]
    pub bot_access_token: Option<String>,
    #[serde(default)]
    pub bot_user_id: Option<String>,
}

/// Team descriptor returned by the OAuth exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// What an install yields: the bot credentials and the team.
#[derive(Debug, Clone, PartialEq)]
pub struct BotInstall {
    pub bot_token: String,
    pub bot_user_id: String,
    pub team: TeamDescriptor,
}

impl OAuthAccessResponse {
    /// Extracts the bot credentials, falling back to the legacy `bot` object.
    pub fn bot_install(self) -> Result<BotInstall, SlackError> {
        let legacy = self.bot.unwrap_or(LegacyBot {
            bot_access_token: None,
            bot_user_id: None,
        });

        let bot_token = self.access_token.or(legacy.bot_access_token);
        let bot_user_id = self.bot_user_id.or(legacy.bot_user_id);

        let (Some(bot_token), Some(bot_user_id)) = (bot_token, bot_user_id) else {
            return Err(SlackError::Api("Bot token missing in response".to_string()));
        };

        let team = self
            .team
            .filter(|t| !t.id.is_empty())
            .ok_or_else(|| SlackError::Api("Team missing in response".to_string()))?;

        Ok(BotInstall {
            bot_token,
            bot_user_id,
            team,
        })
    }
}

/// Generic Web API envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Serialize)]
struct OpenView<'a> {
    trigger_id: &'a str,
    view: &'a View,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    blocks: &'a [Block],
}

impl SlackClient {
    /// Creates a client with the given API base and request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        config: SlackConfig,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SlackError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SlackError::Request(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            config: Arc::new(config),
        })
    }

    /// The Slack app configuration.
    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Trades an OAuth authorization code for an access token.
    ///
    /// # Errors
    ///
    /// `SlackError::Api` carrying Slack's error code when Slack rejects the code.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthAccessResponse, SlackError> {
        let response = self
            .http
            .post(self.url("oauth.v2.access"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SlackError::Request(e.to_string()))?;

        let result: OAuthAccessResponse = response
            .json()
            .await
            .map_err(|e| SlackError::Response(e.to_string()))?;

        if !result.ok {
            warn!(error = ?result.error, "Slack OAuth exchange rejected");
            return Err(SlackError::Api(
                result
                    .error
                    .unwrap_or_else(|| "Slack auth failed".to_string()),
            ));
        }

        debug!(team = ?result.team.as_ref().map(|t| &t.id), "Slack OAuth exchange succeeded");

        Ok(result)
    }

    /// Opens a modal in response to a trigger.
    #[instrument(skip(self, bot_token, view))]
    pub async fn open_view(
        &self,
        bot_token: &str,
        trigger_id: &str,
        view: &View,
    ) -> Result<ApiResponse, SlackError> {
        self.call("views.open", bot_token, &OpenView { trigger_id, view })
            .await
    }

    /// Posts a message to a channel or user.
    #[instrument(skip(self, bot_token, text, blocks), fields(channel = %channel))]
    pub async fn post_message(
        &self,
        bot_token: &str,
        channel: &str,
        text: &str,
        blocks: &[Block],
    ) -> Result<ApiResponse, SlackError> {
        let result = self
            .call(
                "chat.postMessage",
                bot_token,
                &PostMessage {
                    channel,
                    text,
                    blocks,
                },
            )
            .await?;

        debug!(ts = ?result.ts, "Message posted to Slack");

        Ok(result)
    }

    async fn call<B: Serialize>(
        &self,
        method: &str,
        bot_token: &str,
        body: &B,
    ) -> Result<ApiResponse, SlackError> {
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(bot_token)
            .json(body)
            .send()
            .await
            .map_err(|e| SlackError::Request(e.to_string()))?;

        let result: ApiResponse = response
            .json()
            .await
            .map_err(|e| SlackError::Response(e.to_string()))?;

        if !result.ok {
            return Err(SlackError::Api(
                result.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(result)
    }
}
