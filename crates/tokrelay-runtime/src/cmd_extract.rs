//! `tokrelay extract`: run the extractor over one raw token source.

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokrelay_core::{TokenSourceKind, TokenSources, consolidate};

use crate::cli::ExtractOpts;
use crate::input::read_input;

pub fn cmd_extract(opts: &ExtractOpts) -> anyhow::Result<()> {
    let raw = read_input(&opts.file)?;
    let rendered = render_tokens(&raw, opts.kind.into(), Utc::now())?;
    println!("{rendered}");
    Ok(())
}

/// Canonical tokens of `raw` as pretty JSON.
pub fn render_tokens(raw: &str, kind: TokenSourceKind, now: DateTime<Utc>) -> anyhow::Result<String> {
    let sources = TokenSources::default().with(kind, raw);
    let tokens = consolidate(&sources, now).with_context(|| format!("cannot extract {kind}"))?;
    tracing::debug!(source = %kind, tokens = tokens.len(), "extracted");
    Ok(serde_json::to_string_pretty(&tokens)?)
}
