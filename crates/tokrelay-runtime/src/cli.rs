//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokrelay_core::TokenSourceKind;

#[derive(Parser)]
#[command(name = "tokrelay", about = "Normalize captured session tokens and relay session notifications")]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/tokrelay/config.toml)
    #[arg(long, short = 'c', global = true, env = "TOKRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Notify about one session or a JSON array of sessions
    Notify(NotifyOpts),
    /// Print the canonical tokens of one raw token source
    Extract(ExtractOpts),
}

#[derive(clap::Args)]
pub struct NotifyOpts {
    /// Session JSON file ("-" reads stdin)
    pub file: PathBuf,

    /// Print deliveries to stdout instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for temporary token artifacts
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,

    /// Notify sessions that carry no tokens
    #[arg(long)]
    pub notify_empty: bool,
}

#[derive(clap::Args)]
pub struct ExtractOpts {
    /// Raw token source file ("-" reads stdin)
    pub file: PathBuf,

    /// Which session source the payload came from
    #[arg(long, value_enum, default_value_t = SourceArg::Session)]
    pub kind: SourceArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Session,
    Http,
    Body,
    Custom,
}

impl From<SourceArg> for TokenSourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Session => Self::Session,
            SourceArg::Http => Self::Http,
            SourceArg::Body => Self::Body,
            SourceArg::Custom => Self::Custom,
        }
    }
}

/// Default config location, honoring `$XDG_CONFIG_HOME`.
pub fn default_config_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return PathBuf::from(dir).join("tokrelay/config.toml");
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/tokrelay/config.toml")
}
