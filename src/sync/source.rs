//! Collaborator interfaces bounding the sync core

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

/// One track of a remote playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub duration_seconds: u32,
}

impl TrackRef {
    /// Display title and search query, "{artist} - {name}"
    pub fn title(&self) -> String {
        format!("{} - {}", self.artist, self.name)
    }
}

/// A remote playlist with its fully resolved track list
#[derive(Debug, Clone)]
pub struct RemotePlaylist {
    pub name: String,
    pub tracks: Vec<TrackRef>,
}

/// A search hit that may or may not be the track we want
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub title: String,
    pub duration_seconds: Option<u32>,
    pub source_url: String,
}

/// Remote catalog of playlists
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// All playlists on the account, id to display name
    async fn list_playlists(&self) -> Result<BTreeMap<String, String>>;

    /// Name and ordered tracks of a playlist, `None` if the provider does not know it
    async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Option<RemotePlaylist>>;
}

/// Search and fetch provider for audio
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Ranked search results; empty on transport failure
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchCandidate>;

    /// Fetch `source_url` into exactly `destination`. Returns false on failure.
    async fn download(&self, source_url: &str, destination: &Path) -> bool;
}
