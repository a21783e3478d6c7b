//! CLI command handlers

use anyhow::Result;
use colored::Colorize;
use indicatif::MultiProgress;

use crate::config::Settings;
use crate::library::{LibraryLayout, PlaylistRegistry};
use crate::spotify::SpotifyClient;
use crate::sync::{AddOutcome, PlaylistOutcome, ReconcileReport, SyncEngine};
use crate::youtube::YtDlp;

/// Build the engine with the Spotify and yt-dlp collaborators
fn engine(settings: &Settings) -> Result<SyncEngine> {
    let playlists = SpotifyClient::new(Settings::spotify_credentials()?)?;
    let audio = YtDlp::new(&settings.ytdlp_path);

    SyncEngine::new(
        LibraryLayout::new(&settings.root),
        Box::new(playlists),
        Box::new(audio),
        settings.reconcile,
    )
}

/// Handle the `list` command
pub async fn list(settings: &Settings) -> Result<()> {
    let engine = engine(settings)?;
    let playlists = engine.remote_playlists().await?;

    if playlists.is_empty() {
        println!("{}", "No playlists found on your account.".yellow());
        return Ok(());
    }

    println!("{}", "Your Spotify playlists:".green().bold());
    for (id, name) in &playlists {
        println!("  {} ({})", name, id.dimmed());
    }

    Ok(())
}

/// Handle the `synced` command
pub async fn synced(settings: &Settings) -> Result<()> {
    let engine = engine(settings)?;
    let tracked = engine.tracked().await?;

    if tracked.is_empty() {
        println!("{}", "No playlists are currently synced.".yellow());
        return Ok(());
    }

    println!("{}", "Currently synced playlists:".green().bold());
    for playlist in &tracked {
        let name = match &playlist.name {
            Some(name) => name.normal(),
            None => "Unknown Playlist".red(),
        };
        let local = playlist
            .local_tracks
            .map(|n| format!(", {} local tracks", n))
            .unwrap_or_default();
        println!("  {} ({}{})", name, playlist.id.dimmed(), local);
    }

    Ok(())
}

/// Handle the `add` command
pub async fn add(settings: &Settings, progress: &MultiProgress, playlist_id: &str) -> Result<()> {
    let mut engine = engine(settings)?.with_progress(progress.clone());

    match engine.add(playlist_id).await? {
        AddOutcome::NotFound => {
            println!("{}", "Playlist ID not found on your account.".red());
        }
        AddOutcome::Added(report) => {
            println!("{} {}", "Added:".green().bold(), report.playlist_name);
            print_report(&report);
        }
        AddOutcome::AlreadyTracked(report) => {
            println!("{}", "Playlist is already being tracked.".yellow());
            print_report(&report);
        }
    }

    Ok(())
}

/// Handle the `remove` command
///
/// Works offline: only the registry is touched, files stay on disk.
pub fn remove(settings: &Settings, playlist_id: &str) -> Result<()> {
    let layout = LibraryLayout::new(&settings.root);
    let mut registry = PlaylistRegistry::open(&layout.registry_path())?;

    if registry.remove(playlist_id)? {
        println!("{}", "Removed playlist from sync list.".green());
    } else {
        println!("{}", "Playlist is not currently tracked.".yellow());
    }

    Ok(())
}

/// Handle the `sync` command
pub async fn sync(settings: &Settings, progress: &MultiProgress) -> Result<()> {
    let engine = engine(settings)?.with_progress(progress.clone());
    let outcomes = engine.sync_all().await?;

    if outcomes.is_empty() {
        println!(
            "{}",
            "No playlists to sync. Add one with: tunemirror add <playlist_id>".yellow()
        );
        return Ok(());
    }

    let mut added = 0;
    let mut failed = 0;
    let mut removed = 0;

    for (id, outcome) in &outcomes {
        match outcome {
            PlaylistOutcome::Synced(report) => {
                print_report(report);
                added += report.added.len();
                failed += report.failed.len();
                removed += report.removed.len();
            }
            PlaylistOutcome::NotFound => {
                println!("{} {} not found. Skipping.", "Playlist".red(), id);
            }
            PlaylistOutcome::Failed(message) => {
                println!("{} {}: {}", "Failed to sync".red().bold(), id, message);
            }
        }
    }

    println!();
    println!("{}", "Sync complete!".green().bold());
    println!("  Playlists: {}", outcomes.len());
    println!("  Tracks added: {}", added);
    println!("  Tracks failed: {}", failed);
    println!("  Tracks removed: {}", removed);

    Ok(())
}

fn print_report(report: &ReconcileReport) {
    println!();
    println!(
        "{} {} ({}, {} already present)",
        "Playlist:".cyan().bold(),
        report.playlist_name,
        report.playlist_id.dimmed(),
        report.unchanged
    );

    if report.is_noop() {
        println!("  {}", "Up to date.".green());
        return;
    }

    if !report.added.is_empty() {
        println!("  {} {}", "Added:".green(), report.added.len());
    }
    if !report.repaired.is_empty() {
        println!("  {} {}", "Missing files re-fetched:".yellow(), report.repaired.len());
    }
    for failed in &report.failed {
        println!("  {} {} ({})", "Failed:".red(), failed.title, failed.reason);
    }
    if !report.removed.is_empty() {
        println!("  {} {}", "Removed:".yellow(), report.removed.len());
    }
}
