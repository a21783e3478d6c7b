//! Runtime settings gathered from the environment

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use crate::spotify::SpotifyCredentials;
use crate::sync::ReconcileOptions;

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";

/// Everything the commands need besides their positional arguments
#[derive(Debug, Clone)]
pub struct Settings {
    /// Library root holding playlists.json and the playlists folder
    pub root: PathBuf,
    /// yt-dlp executable
    pub ytdlp_path: PathBuf,
    pub reconcile: ReconcileOptions,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env(root: Option<PathBuf>) -> Result<Self> {
        Self::from_lookup(root, |key| std::env::var(key).ok())
    }

    fn from_lookup(root: Option<PathBuf>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let root = root.unwrap_or_else(default_root);
        let ytdlp_path = lookup("YTDLP_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));

        let defaults = ReconcileOptions::default();
        let reconcile = ReconcileOptions {
            search_results: parse_var(&lookup, "TUNEMIRROR_SEARCH_RESULTS")?
                .unwrap_or(defaults.search_results),
            tolerance: parse_var(&lookup, "TUNEMIRROR_TOLERANCE")?.unwrap_or(defaults.tolerance),
        };
        if reconcile.search_results == 0 {
            anyhow::bail!("TUNEMIRROR_SEARCH_RESULTS must be at least 1");
        }

        Ok(Self {
            root,
            ytdlp_path,
            reconcile,
        })
    }

    /// Spotify application credentials, required by commands that talk to Spotify
    pub fn spotify_credentials() -> Result<SpotifyCredentials> {
        spotify_credentials_from(|key| std::env::var(key).ok())
    }
}

fn spotify_credentials_from(lookup: impl Fn(&str) -> Option<String>) -> Result<SpotifyCredentials> {
    let client_id = lookup("SPOTIFY_CLIENT_ID")
        .context("SPOTIFY_CLIENT_ID is not set (environment or .env file)")?;
    let client_secret = lookup("SPOTIFY_CLIENT_SECRET")
        .context("SPOTIFY_CLIENT_SECRET is not set (environment or .env file)")?;
    let redirect_uri =
        lookup("SPOTIFY_REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

    Ok(SpotifyCredentials {
        client_id,
        client_secret,
        redirect_uri,
    })
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}

/// Default library root: the user's music folder, else the working directory
fn default_root() -> PathBuf {
    dirs::audio_dir()
        .map(|dir| dir.join("tunemirror"))
        .unwrap_or_else(|| PathBuf::from("."))
}
