//! Error types for the Telegram transport.

use std::path::PathBuf;

use thiserror::Error;
use tokrelay_notify::TransportError;

#[derive(Debug, Error)]
pub enum TelegramError {
    /// Request-level failure. The URL (which embeds the bot token) is stripped.
    #[error("telegram request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("failed to read artifact {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("malformed telegram response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl From<TelegramError> for TransportError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Api { .. } => TransportError::Rejected(err.to_string()),
            other => TransportError::Failed(Box::new(other)),
        }
    }
}
