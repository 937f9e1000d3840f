//! midi2hid
//!
//! Bridges an electronic drum kit (ALSA sequencer MIDI input) to a USB HID
//! gadget keyboard.

use anyhow::Result;
use clap::Parser;
use tracing::info;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; diagnostics go to stderr, status output to stdout
    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(midi2hid::Config::default_path);
    info!("Loading config from {:?}", config_path);
    let config = midi2hid::Config::load(&config_path)?;

    match cli.command {
        None => {
            let config = cli.run.apply(config);
            config.validate()?;
            commands::run::run(config, cli.run.dry_run, !cli.run.no_echo).await
        }
        Some(Commands::Listen { source }) => {
            let config = midi2hid::Config {
                source: source.or(config.source),
                ..config
            };
            commands::listen::listen(&config).await
        }
        Some(Commands::Mapping) => {
            commands::show::mapping(&config);
            Ok(())
        }
        Some(Commands::Compile { spec }) => {
            commands::show::compile(&spec.join(" "));
            Ok(())
        }
    }
}
