//! Session notification state machine.
//!
//! Per session id: `Unseen` → `Sent`. The first successful notify sends a new
//! message; every later notify for the same id edits that message in place
//! with the session's current contents. A failed send leaves the id `Unseen`.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokrelay_core::{Session, consolidate};

use crate::artifact::Artifact;
use crate::config::{ConfigProvider, NotifierConfig};
use crate::error::NotifyError;
use crate::store::{NotificationRecord, NotificationStore};
use crate::transport::{MessageHandle, Transport};

// ─── Options ──────────────────────────────────────────────────────

/// What to do with a first observation that carries no tokens at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyTokenPolicy {
    /// Do not send; the session stays unseen and a later observation may send.
    #[default]
    Skip,
    /// Send the summary with an empty token list.
    Notify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOptions {
    /// Directory receiving temporary token artifacts.
    pub artifact_dir: PathBuf,
    pub empty_tokens: EmptyTokenPolicy,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            artifact_dir: std::env::temp_dir(),
            empty_tokens: EmptyTokenPolicy::default(),
        }
    }
}

// ─── Outcome ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// First delivery for this session id.
    Created { handle: Option<MessageHandle> },
    /// The earlier delivery was edited in place.
    Updated { handle: MessageHandle },
    /// Nothing to deliver under [`EmptyTokenPolicy::Skip`].
    Skipped,
}

// ─── Notifier ─────────────────────────────────────────────────────

pub struct Notifier<T, C> {
    transport: T,
    config: C,
    store: NotificationStore,
    options: NotifyOptions,
}

impl<T: Transport, C: ConfigProvider> Notifier<T, C> {
    pub fn new(transport: T, config: C, store: NotificationStore, options: NotifyOptions) -> Self {
        Self {
            transport,
            config,
            store,
            options,
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn options(&self) -> &NotifyOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Notify about `session`, creating or updating its delivered message.
    ///
    /// Errors are logged here and returned; none of them is fatal, and shared
    /// state only changes on a successful first send.
    pub async fn notify(&self, session: &Session) -> Result<NotifyOutcome, NotifyError> {
        let result = self.transition(session).await;
        match &result {
            Ok(NotifyOutcome::Created { handle }) => tracing::info!(
                session_id = %session.id,
                handle = handle.as_ref().map(MessageHandle::as_str),
                "session notification sent"
            ),
            Ok(NotifyOutcome::Updated { handle }) => tracing::info!(
                session_id = %session.id,
                handle = handle.as_str(),
                "session notification updated"
            ),
            Ok(NotifyOutcome::Skipped) => {
                tracing::info!(session_id = %session.id, "no tokens captured, notification skipped");
            }
            Err(e @ NotifyError::UnknownMessageHandle { .. }) => {
                tracing::warn!(session_id = %session.id, error = %e, "cannot update session notification");
            }
            Err(e) => {
                tracing::error!(session_id = %session.id, error = %e, "session notification failed");
            }
        }
        result
    }

    async fn transition(&self, session: &Session) -> Result<NotifyOutcome, NotifyError> {
        let config = self.config.load()?;

        // Held until the transition completes, transport round-trip included.
        let mut record = self.store.lock(&session.id).await;
        if record.sent {
            return self.update(session, &config, &record).await;
        }
        let outcome = self.create(session, &config, &mut record).await;
        self.store.release(&session.id, record).await;
        outcome
    }

    async fn create(
        &self,
        session: &Session,
        config: &NotifierConfig,
        record: &mut NotificationRecord,
    ) -> Result<NotifyOutcome, NotifyError> {
        let tokens = consolidate(&session.tokens, Utc::now())?;
        if tokens.is_empty() && self.options.empty_tokens == EmptyTokenPolicy::Skip {
            return Ok(NotifyOutcome::Skipped);
        }

        let artifact = Artifact::from_tokens(session, &tokens, &self.options.artifact_dir)?;
        let handle = self
            .transport
            .send(config, artifact.summary(), artifact.path())
            .await
            .map_err(NotifyError::TransportSendFailed)?;

        record.sent = true;
        record.delivered_handle = handle.clone();
        Ok(NotifyOutcome::Created { handle })
    }

    async fn update(
        &self,
        session: &Session,
        config: &NotifierConfig,
        record: &NotificationRecord,
    ) -> Result<NotifyOutcome, NotifyError> {
        let Some(handle) = record.delivered_handle.clone() else {
            return Err(NotifyError::UnknownMessageHandle {
                session_id: session.id.clone(),
            });
        };

        let artifact = Artifact::build(session, &self.options.artifact_dir, Utc::now())?;
        self.transport
            .edit(config, &handle, artifact.path(), artifact.summary())
            .await
            .map_err(NotifyError::TransportEditFailed)?;

        Ok(NotifyOutcome::Updated { handle })
    }
}
