//! Delivery seam. Implementations live at the IO boundary (e.g. the Telegram crate).

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NotifierConfig;

/// Opaque reference to a delivered message, returned by [`Transport::send`]
/// and required by [`Transport::edit`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHandle(String);

impl MessageHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote side refused the request.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("delivery failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Outbound notification transport.
///
/// `artifact` is only guaranteed to exist until the returned future completes.
pub trait Transport: Send + Sync {
    /// Deliver `message` with `artifact` attached.
    ///
    /// Returns `None` when the transport cannot address the delivery later
    /// (no in-place edit possible).
    fn send(
        &self,
        config: &NotifierConfig,
        message: &str,
        artifact: &Path,
    ) -> impl Future<Output = Result<Option<MessageHandle>, TransportError>> + Send;

    /// Replace the attachment and text of a previously delivered message.
    fn edit(
        &self,
        config: &NotifierConfig,
        handle: &MessageHandle,
        artifact: &Path,
        message: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        config: &NotifierConfig,
        message: &str,
        artifact: &Path,
    ) -> impl Future<Output = Result<Option<MessageHandle>, TransportError>> + Send {
        (**self).send(config, message, artifact)
    }

    fn edit(
        &self,
        config: &NotifierConfig,
        handle: &MessageHandle,
        artifact: &Path,
        message: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).edit(config, handle, artifact, message)
    }
}
