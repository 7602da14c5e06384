use thiserror::Error;

/// Slack integration errors
#[derive(Debug, Error)]
pub enum SlackError {
    /// HTTP request failed
    #[error("Slack request failed: {0}")]
    Request(String),

    /// Response body could not be read or parsed
    #[error("Slack response error: {0}")]
    Response(String),

    /// Slack answered with `ok: false`; carries Slack's error code
    #[error("{0}")]
    Api(String),

    /// Inbound request failed signature verification
    #[error("Invalid Slack signature: {0}")]
    InvalidSignature(String),

    /// Interaction or command payload is malformed
    #[error("Invalid Slack payload: {0}")]
    InvalidPayload(String),
}
