/// Slack integration
///
/// - [`client`]: Web API client (OAuth exchange, `views.open`, `chat.postMessage`)
/// - [`signature`]: Inbound request signature verification
/// - [`blocks`]: Block Kit builders for the task modal and task messages
/// - [`interactions`]: Interaction payloads and modal form extraction
///
/// This module also owns the install URL and URL-encoded form parsing shared
/// by the slash command and interaction endpoints.

pub mod blocks;
pub mod client;
pub mod error;
pub mod interactions;
pub mod signature;

use std::collections::HashMap;

pub use client::SlackClient;
pub use error::SlackError;

/// Slack's OAuth v2 authorize endpoint
pub const AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";

/// Bot scopes requested on install
pub const SCOPES: [&str; 5] = [
    "commands",
    "chat:write",
    "chat:write.public",
    "users:read",
    "team:read",
];

/// Credentials of the Slack app
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub client_id: String,
    pub client_secret: String,
    pub signing_secret: String,
    /// OAuth redirect, `{APP_BASE_URL}/slack/oauth/callback`
    pub redirect_uri: String,
}

impl SlackConfig {
    /// Builds a config whose redirect URI points at `base_url`
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        signing_secret: impl Into<String>,
        base_url: &str,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            signing_secret: signing_secret.into(),
            redirect_uri: format!("{}/slack/oauth/callback", base_url.trim_end_matches('/')),
        }
    }
}

/// Builds the "Add to Slack" URL
///
/// The result is deterministic for a given config. Callers append
/// `&state=<access key>` to tie the install to a verified key.
pub fn build_install_url(config: &SlackConfig) -> String {
    format!(
        "{}?client_id={}&scope={}&user_scope=&redirect_uri={}",
        AUTHORIZE_URL,
        urlencoding::encode(&config.client_id),
        SCOPES.join("%20"),
        urlencoding::encode(&config.redirect_uri),
    )
}

/// Parses an `application/x-www-form-urlencoded` body
///
/// `+` decodes to a space. Pairs that fail to decode are skipped; a repeated
/// key keeps its last value.
pub fn parse_form(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

/// Extracts the JSON document from an interaction body (`payload=<json>`)
pub fn extract_payload(body: &str) -> Result<String, SlackError> {
    parse_form(body)
        .remove("payload")
        .ok_or_else(|| SlackError::InvalidPayload("missing payload field".to_string()))
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SlackConfig {
        SlackConfig::new("123.456", "shh", "signing", "https://tako.example.com/")
    }

    #[test]
    fn test_redirect_uri_from_base_url() {
        assert_eq!(
            config().redirect_uri,
            "https://tako.example.com/slack/oauth/callback"
        );
    }

    #[test]
    fn test_build_install_url() {
        let url = build_install_url(&config());
        assert_eq!(
            url,
            "https://slack.com/oauth/v2/authorize?client_id=123.456\
             &scope=commands%20chat:write%20chat:write.public%20users:read%20team:read\
             &user_scope=\
             &redirect_uri=https%3A%2F%2Ftako.example.com%2Fslack%2Foauth%2Fcallback"
        );
        assert_eq!(url, build_install_url(&config()));
    }

    #[test]
    fn test_parse_form() {
        let form = parse_form("team_id=T1&command=%2Ftask&text=create+now&empty=&flag");
        assert_eq!(form["team_id"], "T1");
        assert_eq!(form["command"], "/task");
        assert_eq!(form["text"], "create now");
        assert_eq!(form["empty"], "");
        assert_eq!(form["flag"], "");
    }

    #[test]
    fn test_parse_form_keeps_encoded_plus() {
        let form = parse_form("text=a%2Bb");
        assert_eq!(form["text"], "a+b");
    }

    #[test]
    fn test_extract_payload() {
        let body = format!("payload={}", urlencoding::encode(r#"{"type":"block_actions"}"#));
        assert_eq!(extract_payload(&body).unwrap(), r#"{"type":"block_actions"}"#);

        assert!(matches!(
            extract_payload("token=abc"),
            Err(SlackError::InvalidPayload(_))
        ));
    }
}
