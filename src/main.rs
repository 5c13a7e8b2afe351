//! Melseal CLI - Audio Signing
//!
//! Command-line interface for the Melseal signing pipeline.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use melseal::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Melseal v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Melseal v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Process {
            input,
            output,
            manifest,
            public_key,
            config,
            segment_duration,
            key_bits,
        } => {
            let config = commands::resolve_config(config.as_deref(), segment_duration)?;
            let sidecars = commands::ProcessOutputs {
                manifest: manifest.as_deref(),
                public_key: public_key.as_deref(),
            };
            let report = commands::process(&input, &output, sidecars, config, key_bits)?;
            if !report.all_valid() {
                anyhow::bail!("segments failed verification: {:?}", report.failed_segments());
            }
            Ok(())
        }
        Commands::Verify {
            input,
            manifest,
            public_key,
            config,
            segment_duration,
        } => {
            let base = commands::resolve_config(config.as_deref(), None)?;
            let report = commands::verify(&input, &manifest, &public_key, base, segment_duration)?;
            if !report.all_valid() {
                anyhow::bail!("segments failed verification: {:?}", report.failed_segments());
            }
            Ok(())
        }
        Commands::Features {
            input,
            config,
            segment_duration,
        } => {
            let config = commands::resolve_config(config.as_deref(), segment_duration)?;
            commands::features(&input, config)?;
            Ok(())
        }
    }
}
