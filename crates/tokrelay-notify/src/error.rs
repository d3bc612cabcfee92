//! Error taxonomy reported at the notify boundary.

use thiserror::Error;
use tokrelay_core::{ConsolidateError, TokenSourceKind};

use crate::config::ConfigError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier config unavailable: {0}")]
    ConfigUnavailable(#[from] ConfigError),

    #[error("{kind} matches no known token shape")]
    MalformedTokenSource { kind: TokenSourceKind, raw: String },

    #[error("failed to write token artifact: {0}")]
    ArtifactWriteFailed(#[source] std::io::Error),

    #[error("transport send failed: {0}")]
    TransportSendFailed(#[source] TransportError),

    #[error("transport edit failed: {0}")]
    TransportEditFailed(#[source] TransportError),

    #[error("session {session_id} is marked sent but has no delivered message handle")]
    UnknownMessageHandle { session_id: String },
}

impl From<ConsolidateError> for NotifyError {
    fn from(err: ConsolidateError) -> Self {
        match err {
            ConsolidateError::MalformedTokenSource { kind, raw } => {
                Self::MalformedTokenSource { kind, raw }
            }
        }
    }
}
