//! Bot API calls: `sendDocument` for new deliveries, `editMessageMedia` for updates.

use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokrelay_notify::{MessageHandle, NotifierConfig, Transport, TransportError};

use crate::error::TelegramError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API limit for media captions.
pub const MAX_CAPTION_CHARS: usize = 1024;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Multipart field name the document is uploaded under.
const DOCUMENT_FIELD: &str = "document";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

/// Telegram Bot API transport.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    client: reqwest::Client,
    api_base: String,
}

impl TelegramTransport {
    pub fn new() -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.to_owned(),
        }
    }

    /// Point at a different Bot API server (self-hosted or test double).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{token}/{method}", self.api_base)
    }

    /// Upload `artifact` as a document with `caption`. Returns the message id.
    pub async fn send_document(
        &self,
        chat_id: &str,
        token: &str,
        caption: &str,
        artifact: &Path,
    ) -> Result<i64, TelegramError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_owned())
            .text("caption", truncate_caption(caption).into_owned())
            .part(DOCUMENT_FIELD, document_part(artifact).await?);

        let result = self.call(token, "sendDocument", form).await?;
        result
            .as_ref()
            .and_then(|r| r.get("message_id"))
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| TelegramError::MalformedResponse("sendDocument result has no message_id".into()))
    }

    /// Replace the document and caption of message `message_id`.
    pub async fn edit_document(
        &self,
        chat_id: &str,
        token: &str,
        message_id: &str,
        artifact: &Path,
        caption: &str,
    ) -> Result<(), TelegramError> {
        let media = serde_json::json!({
            "type": "document",
            "media": format!("attach://{DOCUMENT_FIELD}"),
            "caption": truncate_caption(caption),
        });
        let form = Form::new()
            .text("chat_id", chat_id.to_owned())
            .text("message_id", message_id.to_owned())
            .text("media", media.to_string())
            .part(DOCUMENT_FIELD, document_part(artifact).await?);

        self.call(token, "editMessageMedia", form).await?;
        Ok(())
    }

    async fn call(
        &self,
        token: &str,
        method: &str,
        form: Form,
    ) -> Result<Option<serde_json::Value>, TelegramError> {
        let response = self
            .client
            .post(self.method_url(token, method))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: ApiResponse = serde_json::from_str(&body).map_err(|_| {
            TelegramError::MalformedResponse(format!(
                "{status}: {}",
                truncate_chars(&body, MAX_ERROR_BODY_CHARS)
            ))
        })?;

        if !parsed.ok || !status.is_success() {
            return Err(TelegramError::Api {
                code: parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: parsed.description.unwrap_or_default(),
            });
        }
        tracing::debug!(method, %status, "telegram call succeeded");
        Ok(parsed.result)
    }
}

impl Transport for TelegramTransport {
    async fn send(
        &self,
        config: &NotifierConfig,
        message: &str,
        artifact: &Path,
    ) -> Result<Option<MessageHandle>, TransportError> {
        let message_id = self
            .send_document(&config.chat_id, &config.bot_token, message, artifact)
            .await?;
        Ok(Some(MessageHandle::new(message_id.to_string())))
    }

    async fn edit(
        &self,
        config: &NotifierConfig,
        handle: &MessageHandle,
        artifact: &Path,
        message: &str,
    ) -> Result<(), TransportError> {
        self.edit_document(
            &config.chat_id,
            &config.bot_token,
            handle.as_str(),
            artifact,
            message,
        )
        .await?;
        Ok(())
    }
}

async fn document_part(artifact: &Path) -> Result<Part, TelegramError> {
    let bytes = tokio::fs::read(artifact)
        .await
        .map_err(|source| TelegramError::Artifact {
            path: artifact.to_owned(),
            source,
        })?;
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tokens.json".to_owned());
    Ok(Part::bytes(bytes).file_name(file_name))
}

/// Clamp a caption to [`MAX_CAPTION_CHARS`], marking the cut with an ellipsis.
pub fn truncate_caption(caption: &str) -> Cow<'_, str> {
    truncate_chars(caption, MAX_CAPTION_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some(_) => {
            let keep: String = text.chars().take(max_chars.saturating_sub(1)).collect();
            Cow::Owned(format!("{keep}\u{2026}"))
        }
    }
}
