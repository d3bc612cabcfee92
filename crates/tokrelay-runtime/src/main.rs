//! tokrelay: session token relay binary.
//! Reads captured sessions, normalizes their tokens, and delivers one
//! notification per session id (edited in place on later observations).

use clap::Parser;

mod cli;
mod cmd_extract;
mod cmd_notify;
mod dry_run;
mod input;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("TOKRELAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        cli::Command::Notify(opts) => {
            let config_path = args.config.unwrap_or_else(cli::default_config_path);
            let summary = cmd_notify::cmd_notify(&opts, &config_path).await?;
            println!("{summary}");
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }
        cli::Command::Extract(opts) => {
            cmd_extract::cmd_extract(&opts)?;
        }
    }

    Ok(())
}
