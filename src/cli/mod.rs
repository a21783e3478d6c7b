//! CLI module for tunemirror

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "tunemirror", about = "Mirror Spotify playlists into a local music library")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Library root directory
    #[arg(long, global = true, env = "TUNEMIRROR_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show all Spotify playlists on your account
    List,

    /// Show playlists currently being synced
    Synced,

    /// Add a playlist to the sync list and sync it now
    Add {
        /// Spotify playlist ID
        playlist_id: String,
    },

    /// Remove a playlist from the sync list (downloaded files are kept)
    Remove {
        /// Spotify playlist ID
        playlist_id: String,
    },

    /// Sync all currently tracked playlists
    Sync,
}
