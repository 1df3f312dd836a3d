//! The kestrel bot binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use kestrel::runtime::{
    Credentials, Session, build_handler, cancel_on_shutdown, load_config_from_file, logging,
};
use kestrel::transport::WsDialer;

#[derive(Debug, Parser)]
#[command(name = "kestrel", version, about = "A configurable Twitch chat bot")]
struct Cli {
    /// Bot configuration file.
    #[arg(long, default_value = "./config.yml")]
    config: PathBuf,

    /// Credentials file.
    #[arg(long, default_value = "./creds.yml")]
    creds: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config_from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    logging::init_from_config(&config.logging);

    let creds = Credentials::load(&cli.creds)
        .with_context(|| format!("failed to load {}", cli.creds.display()))?;

    let handler = build_handler(&config, &creds).context("failed to build handlers")?;
    let dialer = Arc::new(WsDialer::new(config.session.endpoint.as_str()));

    info!(channels = config.channels.len(), "Kestrel is starting");

    Session::new(dialer, handler, creds, &config)
        .run(cancel_on_shutdown())
        .await?;

    Ok(())
}
