//! tunemirror - Mirror Spotify playlists into a local music library

use anyhow::Result;
use clap::{CommandFactory, Parser};
use indicatif::MultiProgress;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod library;
mod spotify;
mod sync;
mod utils;
mod youtube;

use cli::{Cli, Commands};
use config::Settings;
use utils::ProgressLogWriter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tunemirror=debug,reqwest=debug"
    } else {
        "tunemirror=info"
    };

    // Bars and log lines share stderr
    let progress = MultiProgress::new();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(ProgressLogWriter::new(progress.clone())),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = Settings::from_env(cli.root)?;

    match command {
        Commands::List => cli::commands::list(&settings).await?,
        Commands::Synced => cli::commands::synced(&settings).await?,
        Commands::Add { playlist_id } => {
            cli::commands::add(&settings, &progress, &playlist_id).await?
        }
        Commands::Remove { playlist_id } => cli::commands::remove(&settings, &playlist_id)?,
        Commands::Sync => cli::commands::sync(&settings, &progress).await?,
    }

    Ok(())
}
