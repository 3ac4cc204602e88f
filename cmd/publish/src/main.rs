//! mqforward-publish - test publisher for the mqforward ingestion pipeline.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod publisher;
#[cfg(test)]
mod tests;

use commands::{DecodeCommand, EncodeCommand, PublishCommand};

/// Publish a MessagePack test message to the mqforward pipeline.
///
/// Without a subcommand, publishes `{a: 10, b: 10.0}` to `mqforward/a/b`
/// on localhost:1883 once and exits.
///
/// Settings are read from ~/.mqforward/config.yaml when present; flags
/// override the file.
#[derive(Parser)]
#[command(name = "mqforward-publish")]
#[command(about = "Publish a MessagePack test message to the mqforward pipeline")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.mqforward/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish the test payload once
    Publish(PublishCommand),
    /// Print the encoded test payload
    Encode(EncodeCommand),
    /// Decode a captured payload
    Decode(DecodeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    // Setup logging
    let level = if cli.verbose || cfg.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = cfg.path() {
        tracing::debug!("loaded config from {}", path.display());
    }

    match &cli.command {
        Some(Commands::Publish(cmd)) => cmd.run(&cli, &cfg).await,
        Some(Commands::Encode(cmd)) => cmd.run(&cli),
        Some(Commands::Decode(cmd)) => cmd.run(&cli),
        None => PublishCommand::default().run(&cli, &cfg).await,
    }
}
