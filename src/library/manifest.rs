//! Per-playlist manifest of downloaded tracks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const MANIFEST_FILE: &str = "playlist.json";

/// Failure to read or write a manifest file
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("malformed manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write manifest {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Record of one downloaded track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Display title, "{artist} - {name}"
    pub title: String,
    /// File name inside the playlist folder
    #[serde(rename = "file")]
    pub file_name: String,
    /// Remote track duration
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
    /// Where the audio was fetched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// When the download completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<DateTime<Utc>>,
}

/// What is on disk for one playlist, keyed by remote track id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Path of the manifest inside a playlist folder
    pub fn path(playlist_dir: &Path) -> PathBuf {
        playlist_dir.join(MANIFEST_FILE)
    }

    /// Load the manifest of a playlist folder, empty if there is none yet
    pub fn load(playlist_dir: &Path) -> Result<Self, ManifestError> {
        let path = Self::path(playlist_dir);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No manifest found at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ManifestError::Read { path, source }),
        };

        let manifest: Self = serde_json::from_str(&content)
            .map_err(|source| ManifestError::Parse { path: path.clone(), source })?;

        debug!("Loaded manifest {}: {} tracks", path.display(), manifest.len());
        Ok(manifest)
    }

    /// Save the manifest into a playlist folder
    ///
    /// Writes a sibling temp file first and renames it into place.
    pub fn save(&self, playlist_dir: &Path) -> Result<(), ManifestError> {
        let path = Self::path(playlist_dir);
        let tmp_path = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(self).map_err(|e| ManifestError::Write {
            path: path.clone(),
            source: io::Error::other(e),
        })?;

        fs::write(&tmp_path, content).map_err(|source| ManifestError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| ManifestError::Write {
            path: path.clone(),
            source,
        })?;

        debug!("Saved manifest {} ({} tracks)", path.display(), self.len());
        Ok(())
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.contains_key(track_id)
    }

    pub fn insert(&mut self, track_id: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(track_id.into(), entry);
    }

    pub fn remove(&mut self, track_id: &str) -> Option<ManifestEntry> {
        self.entries.remove(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether any entry points at the given file
    pub fn references_file(&self, file_name: &str) -> bool {
        self.entries.values().any(|e| e.file_name == file_name)
    }

    /// Drop entries whose file is gone from the playlist folder
    ///
    /// Only ids accepted by `wanted` are considered; the rest are left for
    /// pruning. Returns the ids that were dropped.
    pub fn drop_missing_files(
        &mut self,
        playlist_dir: &Path,
        wanted: impl Fn(&str) -> bool,
    ) -> Vec<String> {
        let missing: Vec<String> = self
            .entries
            .iter()
            .filter(|(id, _)| wanted(id))
            .filter(|(_, entry)| !playlist_dir.join(&entry.file_name).is_file())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &missing {
            self.entries.remove(id);
        }
        missing
    }
}
