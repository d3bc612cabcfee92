//! `tokrelay notify`: deliver one notification per session id.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokrelay_core::Session;
use tokrelay_notify::{
    ConfigFile, ConfigProvider, EmptyTokenPolicy, NotificationStore, Notifier, NotifyOptions,
    NotifyOutcome, StaticConfig, TomlConfigProvider, Transport,
};
use tokrelay_telegram::TelegramTransport;

use crate::cli::NotifyOpts;
use crate::dry_run::DryRunTransport;
use crate::input::{parse_sessions, read_input};

/// Per-batch tally of notify outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} skipped={} failed={}",
            self.created, self.updated, self.skipped, self.failed
        )
    }
}

pub async fn cmd_notify(opts: &NotifyOpts, config_path: &Path) -> anyhow::Result<BatchSummary> {
    let file = load_config_file(config_path, opts.dry_run)?;
    let options = resolve_options(&file, opts);
    let sessions = parse_sessions(&read_input(&opts.file)?)?;
    tracing::info!(sessions = sessions.len(), dry_run = opts.dry_run, "notifying sessions");

    if opts.dry_run {
        let notifier = Notifier::new(
            DryRunTransport::stdout(),
            StaticConfig::new("dry-run", "dry-run"),
            NotificationStore::new(),
            options,
        );
        return Ok(run_batch(notifier, sessions).await);
    }

    // The API base is fixed for the process; chat id and token are re-read per call.
    let mut transport = TelegramTransport::new()?;
    if let Some(api_base) = &file.notifier.api_base {
        transport = transport.with_api_base(api_base.as_str());
    }
    let notifier = Notifier::new(
        transport,
        TomlConfigProvider::new(config_path),
        NotificationStore::new(),
        options,
    );
    Ok(run_batch(notifier, sessions).await)
}

/// Dry runs never need credentials, so an unreadable config file falls back
/// to defaults there instead of aborting.
fn load_config_file(config_path: &Path, dry_run: bool) -> anyhow::Result<ConfigFile> {
    match ConfigFile::load(config_path) {
        Ok(file) => Ok(file),
        Err(e) if dry_run => {
            tracing::warn!(error = %e, "ignoring config file for dry run");
            Ok(ConfigFile::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Config file options with command-line overrides applied.
fn resolve_options(file: &ConfigFile, opts: &NotifyOpts) -> NotifyOptions {
    let mut options = file.notify_options();
    if let Some(dir) = &opts.artifact_dir {
        options.artifact_dir = dir.clone();
    }
    if opts.notify_empty {
        options.empty_tokens = EmptyTokenPolicy::Notify;
    }
    options
}

/// Notify every session concurrently on one shared notifier.
///
/// Failures are counted, never propagated: one bad session does not stop the batch.
pub async fn run_batch<T, C>(notifier: Notifier<T, C>, sessions: Vec<Session>) -> BatchSummary
where
    T: Transport + 'static,
    C: ConfigProvider + 'static,
{
    let notifier = Arc::new(notifier);
    let mut tasks = JoinSet::new();
    for session in sessions {
        let notifier = Arc::clone(&notifier);
        tasks.spawn(async move { notifier.notify(&session).await });
    }

    let mut summary = BatchSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(NotifyOutcome::Created { .. })) => summary.created += 1,
            Ok(Ok(NotifyOutcome::Updated { .. })) => summary.updated += 1,
            Ok(Ok(NotifyOutcome::Skipped)) => summary.skipped += 1,
            // Already reported by the notifier.
            Ok(Err(_)) => summary.failed += 1,
            Err(e) => {
                tracing::error!(error = %e, "notify task panicked");
                summary.failed += 1;
            }
        }
    }
    summary
}
