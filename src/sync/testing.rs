//! In-memory collaborators for sync tests

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::source::{AudioSource, PlaylistSource, RemotePlaylist, SearchCandidate, TrackRef};

pub fn track(id: &str, artist: &str, name: &str, duration: u32) -> TrackRef {
    TrackRef {
        id: id.to_string(),
        name: name.to_string(),
        artist: artist.to_string(),
        duration_seconds: duration,
    }
}

pub fn candidate(title: &str, duration: Option<u32>) -> SearchCandidate {
    SearchCandidate {
        title: title.to_string(),
        duration_seconds: duration,
        source_url: format!("https://example.com/{}", title),
    }
}

/// Playlist source backed by a map
#[derive(Default)]
pub struct FakePlaylistSource {
    playlists: Mutex<BTreeMap<String, RemotePlaylist>>,
    hidden: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakePlaylistSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a playlist
    pub fn set(&self, id: &str, name: &str, tracks: Vec<TrackRef>) {
        self.playlists.lock().unwrap().insert(
            id.to_string(),
            RemotePlaylist {
                name: name.to_string(),
                tracks,
            },
        );
    }

    /// Keep the playlist in the listing but answer track requests with not found
    pub fn hide_tracks(&self, id: &str) {
        self.hidden.lock().unwrap().insert(id.to_string());
    }

    /// Playlist ids whose tracks were requested
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaylistSource for FakePlaylistSource {
    async fn list_playlists(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .map(|(id, p)| (id.clone(), p.name.clone()))
            .collect())
    }

    async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Option<RemotePlaylist>> {
        self.fetched.lock().unwrap().push(playlist_id.to_string());
        if self.hidden.lock().unwrap().contains(playlist_id) {
            return Ok(None);
        }
        Ok(self.playlists.lock().unwrap().get(playlist_id).cloned())
    }
}

/// Audio source returning canned results and writing small files
#[derive(Default)]
pub struct FakeAudioSource {
    results: Mutex<HashMap<String, Vec<SearchCandidate>>>,
    failing: Mutex<HashSet<String>>,
    searches: Mutex<Vec<String>>,
    downloads: Mutex<Vec<PathBuf>>,
}

impl FakeAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_results(&self, query: &str, candidates: Vec<SearchCandidate>) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), candidates);
    }

    /// Make downloads of this url fail
    pub fn fail_download(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    /// Destinations of successful downloads
    pub fn downloads(&self) -> Vec<PathBuf> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSource for FakeAudioSource {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchCandidate> {
        self.searches.lock().unwrap().push(query.to_string());
        self.results
            .lock()
            .unwrap()
            .get(query)
            .map(|c| c.iter().take(max_results).cloned().collect())
            .unwrap_or_default()
    }

    async fn download(&self, source_url: &str, destination: &Path) -> bool {
        if self.failing.lock().unwrap().contains(source_url) {
            return false;
        }
        if std::fs::write(destination, source_url.as_bytes()).is_err() {
            return false;
        }
        self.downloads
            .lock()
            .unwrap()
            .push(destination.to_path_buf());
        true
    }
}
