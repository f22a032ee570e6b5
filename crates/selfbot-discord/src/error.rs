use selfbot_core::ServiceError;

/// Errors produced by the Discord adapter.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("no account token configured")]
    NoToken,

    #[error("invalid API base URL: {0}")]
    BadUrl(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway connection error: {0}")]
    Gateway(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed gateway payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("gateway session ended: {0}")]
    Session(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
