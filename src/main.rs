//! Karaoke Studio CLI
//!
//! Command-line interface for instrumental extraction and lyrics.

use clap::Parser;
use log::{error, info};
use tracing_subscriber::EnvFilter;

use karaoke::cli::{commands, Cli, Commands};
use karaoke::{Config, Result};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Karaoke Studio v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(cmd) => handle_command(&config, cmd).map_err(|e| {
            error!("[{}] {}", e.error_code(), e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  - {}", suggestion);
            }
            e
        }),
        None => {
            println!("Karaoke Studio v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &Config, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Process {
            file,
            title,
            output,
            mime,
            no_lyrics,
        } => commands::process_file(
            config,
            &file,
            title.as_deref(),
            output.as_deref(),
            mime.as_deref(),
            no_lyrics,
        ),
        Commands::Youtube { reference, title } => {
            commands::youtube(config, &reference, title.as_deref())
        }
        Commands::Inspect { file } => commands::inspect(&file),
        Commands::Batch { dir, output } => commands::batch(config, &dir, output.as_deref()),
    }
}
