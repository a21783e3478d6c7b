//! Playlist reconciliation
//!
//! Brings one playlist folder in line with the remote playlist:
//! 1. Drop manifest entries of remote tracks whose file disappeared
//! 2. Download every remote track missing from the manifest, saving after each
//! 3. Delete files of tracks that left the playlist, saving once at the end

use chrono::Utc;
use indicatif::ProgressBar;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::error::SyncError;
use super::matcher::{select_best_match, DEFAULT_TOLERANCE_SECS};
use super::source::{AudioSource, PlaylistSource, TrackRef};
use crate::library::{track_file_name, LibraryLayout, Manifest, ManifestEntry};

/// Tunables for a reconciliation pass
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Number of search results to consider per track
    pub search_results: usize,
    /// Allowed duration mismatch in seconds
    pub tolerance: u32,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            search_results: 5,
            tolerance: DEFAULT_TOLERANCE_SECS,
        }
    }
}

/// Why a new track could not be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("no search results")]
    NoResults,
    #[error("no result within duration tolerance")]
    NoMatch,
    #[error("download failed")]
    DownloadFailed,
}

/// A track that was skipped during the addition phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTrack {
    pub id: String,
    pub title: String,
    pub reason: FailureReason,
}

/// Outcome of reconciling one playlist
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub playlist_id: String,
    pub playlist_name: String,
    /// Track ids downloaded in this pass
    pub added: Vec<String>,
    pub failed: Vec<FailedTrack>,
    /// Track ids dropped because they left the playlist
    pub removed: Vec<String>,
    /// Remote track ids whose file had gone missing, queued for another fetch
    pub repaired: Vec<String>,
    /// Tracks already present before this pass
    pub unchanged: usize,
}

impl ReconcileReport {
    /// Nothing was downloaded, removed or attempted
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.failed.is_empty() && self.removed.is_empty()
    }
}

/// Drives one playlist to match its remote state
pub struct Reconciler<'a> {
    layout: &'a LibraryLayout,
    playlists: &'a dyn PlaylistSource,
    audio: &'a dyn AudioSource,
    options: ReconcileOptions,
    progress: ProgressBar,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        layout: &'a LibraryLayout,
        playlists: &'a dyn PlaylistSource,
        audio: &'a dyn AudioSource,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            layout,
            playlists,
            audio,
            options,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report addition progress on the given bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Reconcile a playlist against an already fetched account listing
    pub async fn reconcile_listed(
        &self,
        playlist_id: &str,
        account: &BTreeMap<String, String>,
    ) -> Result<ReconcileReport, SyncError> {
        if !account.contains_key(playlist_id) {
            return Err(SyncError::PlaylistNotFound(playlist_id.to_string()));
        }

        let remote = self
            .playlists
            .get_playlist_tracks(playlist_id)
            .await
            .map_err(SyncError::Remote)?
            .ok_or_else(|| SyncError::PlaylistNotFound(playlist_id.to_string()))?;

        info!(
            "Syncing playlist: {} ({} tracks)",
            remote.name,
            remote.tracks.len()
        );

        let dir = self
            .layout
            .ensure_playlist_dir(&remote.name, playlist_id)
            .await
            .map_err(SyncError::Io)?;

        let mut manifest = Manifest::load(&dir)?;
        if manifest.is_empty() {
            debug!("No tracks recorded yet in {}", dir.display());
        }
        let mut report = ReconcileReport {
            playlist_id: playlist_id.to_string(),
            playlist_name: remote.name.clone(),
            ..Default::default()
        };

        // Missing files of obsolete tracks are handled by pruning
        let remote_ids: HashSet<&str> = remote.tracks.iter().map(|t| t.id.as_str()).collect();
        report.repaired = manifest.drop_missing_files(&dir, |id| remote_ids.contains(id));
        if !report.repaired.is_empty() {
            warn!(
                "{} manifest entries point at missing files, fetching again",
                report.repaired.len()
            );
            manifest.save(&dir)?;
        }

        self.add_missing(&remote.tracks, &dir, &mut manifest, &mut report)
            .await?;
        self.prune_obsolete(&remote_ids, &dir, &mut manifest, &mut report)
            .await?;

        info!(
            "Playlist {}: {} added, {} failed, {} removed",
            report.playlist_name,
            report.added.len(),
            report.failed.len(),
            report.removed.len()
        );
        Ok(report)
    }

    async fn add_missing(
        &self,
        tracks: &[TrackRef],
        dir: &Path,
        manifest: &mut Manifest,
        report: &mut ReconcileReport,
    ) -> Result<(), SyncError> {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for track in tracks {
            if !seen.insert(track.id.as_str()) {
                continue;
            }
            if manifest.contains(&track.id) {
                report.unchanged += 1;
            } else {
                pending.push(track);
            }
        }

        self.progress.set_length(pending.len() as u64);
        self.progress.set_position(0);

        for track in pending {
            let title = track.title();
            self.progress.set_message(title.clone());
            info!("New track: {}", title);

            match self.fetch_track(track, &title, dir).await {
                Ok(entry) => {
                    manifest.insert(track.id.clone(), entry);
                    manifest.save(dir)?;
                    report.added.push(track.id.clone());
                }
                Err(reason) => {
                    warn!("Failed to download {}: {}", title, reason);
                    report.failed.push(FailedTrack {
                        id: track.id.clone(),
                        title,
                        reason,
                    });
                }
            }
            self.progress.inc(1);
        }

        Ok(())
    }

    async fn fetch_track(
        &self,
        track: &TrackRef,
        title: &str,
        dir: &Path,
    ) -> Result<ManifestEntry, FailureReason> {
        let candidates = self.audio.search(title, self.options.search_results).await;
        if candidates.is_empty() {
            return Err(FailureReason::NoResults);
        }

        let best = select_best_match(
            title,
            Some(track.duration_seconds),
            &candidates,
            self.options.tolerance,
        )
        .ok_or(FailureReason::NoMatch)?;

        let file_name = track_file_name(title, &track.id);
        let destination = dir.join(&file_name);

        info!(
            "Downloading: {} ({}s)",
            best.title,
            best.duration_seconds.unwrap_or_default()
        );
        if !self.audio.download(&best.source_url, &destination).await {
            return Err(FailureReason::DownloadFailed);
        }
        if !destination.is_file() {
            warn!(
                "Download reported success but {} is missing",
                destination.display()
            );
            return Err(FailureReason::DownloadFailed);
        }

        Ok(ManifestEntry {
            title: title.to_string(),
            file_name,
            duration_seconds: track.duration_seconds,
            source: Some(best.source_url.clone()),
            downloaded_at: Some(Utc::now()),
        })
    }

    async fn prune_obsolete(
        &self,
        remote_ids: &HashSet<&str>,
        dir: &Path,
        manifest: &mut Manifest,
        report: &mut ReconcileReport,
    ) -> Result<(), SyncError> {
        let obsolete: Vec<String> = manifest
            .ids()
            .filter(|id| !remote_ids.contains(id))
            .map(str::to_string)
            .collect();

        for id in obsolete {
            let Some(entry) = manifest.remove(&id) else {
                continue;
            };

            // Another entry may share the file when titles collide
            if manifest.references_file(&entry.file_name) {
                debug!("Keeping {}, still referenced", entry.file_name);
            } else {
                remove_track_file(&dir.join(&entry.file_name)).await;
            }
            report.removed.push(id);
        }

        manifest.save(dir)?;
        Ok(())
    }
}

/// Best-effort delete; a file that is already gone is fine
async fn remove_track_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!("Removed old track: {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Old track already gone: {}", path.display())
        }
        Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
    }
}
