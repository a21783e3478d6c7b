//! Persistent set of playlists the user has opted into mirroring

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tracked playlist ids, in the order they were added
#[derive(Debug, Clone)]
pub struct PlaylistRegistry {
    path: PathBuf,
    ids: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct RegistryFile(Vec<String>);

impl PlaylistRegistry {
    /// Open the registry stored at `path`, empty if the file does not exist
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No registry at {}, starting empty", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                ids: Vec::new(),
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry {}", path.display()))?;
        let RegistryFile(raw) = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse registry {}", path.display()))?;

        // Older files may contain duplicates; keep first occurrences
        let mut ids: Vec<String> = Vec::with_capacity(raw.len());
        for id in raw {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        debug!("Loaded {} tracked playlists", ids.len());
        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    pub fn list(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, playlist_id: &str) -> bool {
        self.ids.iter().any(|id| id == playlist_id)
    }

    /// Start tracking a playlist. Returns false if it was already tracked.
    pub fn add(&mut self, playlist_id: &str) -> Result<bool> {
        if self.contains(playlist_id) {
            return Ok(false);
        }
        self.ids.push(playlist_id.to_string());
        self.save()?;
        Ok(true)
    }

    /// Stop tracking a playlist. Returns false if it was not tracked.
    pub fn remove(&mut self, playlist_id: &str) -> Result<bool> {
        let before = self.ids.len();
        self.ids.retain(|id| id != playlist_id);
        if self.ids.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&RegistryFile(self.ids.clone()))
            .context("Failed to serialize registry")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write registry {}", self.path.display()))?;

        debug!("Saved {} tracked playlists", self.ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PlaylistRegistry::open(&dir.path().join("playlists.json")).unwrap();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_add_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlists.json");
        let mut registry = PlaylistRegistry::open(&path).unwrap();

        assert!(registry.add("p1").unwrap());
        assert!(!registry.add("p1").unwrap());
        assert!(registry.add("p2").unwrap());
        assert_eq!(registry.list(), ["p1", "p2"]);

        assert!(registry.remove("p1").unwrap());
        assert!(!registry.remove("p1").unwrap());

        let reopened = PlaylistRegistry::open(&path).unwrap();
        assert_eq!(reopened.list(), ["p2"]);
    }

    #[test]
    fn test_open_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlists.json");
        fs::write(&path, r#"["a", "b", "a"]"#).unwrap();

        let registry = PlaylistRegistry::open(&path).unwrap();
        assert_eq!(registry.list(), ["a", "b"]);
    }

    #[test]
    fn test_remove_untracked_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlists.json");
        let mut registry = PlaylistRegistry::open(&path).unwrap();

        assert!(!registry.remove("nope").unwrap());
        assert!(!path.exists());
    }
}
