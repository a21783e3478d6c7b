//! On-disk layout of the mirrored library

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::utils::sanitize_filename;

/// File holding the tracked playlist ids
const REGISTRY_FILE: &str = "playlists.json";

/// Directory holding one folder per playlist
const PLAYLISTS_DIR: &str = "playlists";

/// Extension of downloaded audio files
pub const AUDIO_EXTENSION: &str = "m4a";

/// Resolves every path of the library relative to its root
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    root: PathBuf,
}

impl LibraryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the tracked playlist list
    pub fn registry_path(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    /// Get path to the playlists directory
    pub fn playlists_dir(&self) -> PathBuf {
        self.root.join(PLAYLISTS_DIR)
    }

    /// Folder for a playlist, named after its display name
    ///
    /// Names that leave nothing usable after sanitization fall back to the id.
    pub fn playlist_dir(&self, playlist_name: &str, playlist_id: &str) -> PathBuf {
        self.playlists_dir().join(file_stem(playlist_name, playlist_id))
    }

    /// Create the playlist folder if needed and return its path
    pub async fn ensure_playlist_dir(
        &self,
        playlist_name: &str,
        playlist_id: &str,
    ) -> Result<PathBuf> {
        let path = self.playlist_dir(playlist_name, playlist_id);

        fs::create_dir_all(&path)
            .await
            .with_context(|| format!("Failed to create playlist directory {}", path.display()))?;

        debug!("Playlist folder ready: {}", path.display());
        Ok(path)
    }
}

/// File name for a downloaded track
///
/// Falls back to the track id when nothing usable survives sanitization.
pub fn track_file_name(title: &str, track_id: &str) -> String {
    format!("{}.{}", file_stem(title, track_id), AUDIO_EXTENSION)
}

/// Sanitized name, or the sanitized id when the name is empty or made only
/// of dots, dashes and spaces (`..`, `-`, the bare separator of a title)
fn file_stem(name: &str, id: &str) -> String {
    let stem = sanitize_filename(name);
    if stem.chars().all(|c| matches!(c, '.' | '-' | ' ')) {
        sanitize_filename(id)
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_relative_to_root() {
        let layout = LibraryLayout::new("/music");
        assert_eq!(layout.registry_path(), PathBuf::from("/music/playlists.json"));
        assert_eq!(
            layout.playlist_dir("Road: Trip?", "p1"),
            PathBuf::from("/music/playlists/Road Trip")
        );
    }

    #[test]
    fn test_track_file_name() {
        assert_eq!(
            track_file_name("AC/DC - Back  In Black", "id1"),
            "ACDC - Back In Black.m4a"
        );
    }

    #[test]
    fn test_track_file_name_falls_back_to_id() {
        assert_eq!(track_file_name("???", "4uLU6hMCjMI75M1A2tKUQC"), "4uLU6hMCjMI75M1A2tKUQC.m4a");
    }

    #[test]
    fn test_track_without_usable_artist_or_name_uses_id() {
        // "??? - ???" sanitizes to a lone dash
        assert_eq!(track_file_name("??? - ???", "t9"), "t9.m4a");
        assert_eq!(track_file_name("??? - Song", "t9"), "- Song.m4a");
    }

    #[test]
    fn test_unusable_playlist_names_fall_back_to_id() {
        let layout = LibraryLayout::new("/music");
        assert_eq!(layout.playlist_dir("???", "p1"), PathBuf::from("/music/playlists/p1"));
        assert_eq!(layout.playlist_dir("***", "p2"), PathBuf::from("/music/playlists/p2"));
        assert_eq!(layout.playlist_dir("..", "p3"), PathBuf::from("/music/playlists/p3"));
        assert_eq!(layout.playlist_dir(".", "p4"), PathBuf::from("/music/playlists/p4"));
    }

    #[tokio::test]
    async fn test_ensure_playlist_dir_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let layout = LibraryLayout::new(dir.path());

        let path = layout.ensure_playlist_dir("Chill Mix", "p1").await.unwrap();

        assert!(path.is_dir());
        assert_eq!(path, dir.path().join("playlists").join("Chill Mix"));
    }
}
