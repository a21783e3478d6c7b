//! Sync engine orchestration

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use super::error::SyncError;
use super::reconcile::{ReconcileOptions, ReconcileReport, Reconciler};
use super::source::{AudioSource, PlaylistSource};
use crate::library::{LibraryLayout, Manifest, PlaylistRegistry};

/// Result of asking to track a playlist
#[derive(Debug)]
pub enum AddOutcome {
    /// The id is not on the account or its tracks cannot be read.
    /// The registry is left as it was before the call.
    NotFound,
    /// Newly tracked and synced right away
    Added(ReconcileReport),
    /// Was already tracked; synced again
    AlreadyTracked(ReconcileReport),
}

/// Result of syncing one tracked playlist
#[derive(Debug)]
pub enum PlaylistOutcome {
    Synced(ReconcileReport),
    NotFound,
    Failed(String),
}

/// A tracked playlist as shown to the user
#[derive(Debug, Clone)]
pub struct TrackedPlaylist {
    pub id: String,
    /// Display name, `None` if the playlist left the account
    pub name: Option<String>,
    /// Tracks recorded locally, if a manifest could be read
    pub local_tracks: Option<usize>,
}

/// Sync engine that keeps tracked playlists mirrored on disk
pub struct SyncEngine {
    layout: LibraryLayout,
    registry: PlaylistRegistry,
    playlists: Box<dyn PlaylistSource>,
    audio: Box<dyn AudioSource>,
    options: ReconcileOptions,
    progress: Option<MultiProgress>,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        layout: LibraryLayout,
        playlists: Box<dyn PlaylistSource>,
        audio: Box<dyn AudioSource>,
        options: ReconcileOptions,
    ) -> Result<Self> {
        let registry = PlaylistRegistry::open(&layout.registry_path())?;

        Ok(Self {
            layout,
            registry,
            playlists,
            audio,
            options,
            progress: None,
        })
    }

    /// Draw a progress bar while tracks download
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// All playlists on the remote account
    pub async fn remote_playlists(&self) -> Result<BTreeMap<String, String>> {
        self.playlists
            .list_playlists()
            .await
            .context("Failed to list remote playlists")
    }

    /// Tracked playlists with resolved names
    pub async fn tracked(&self) -> Result<Vec<TrackedPlaylist>> {
        let account = self.remote_playlists().await?;

        let tracked = self
            .registry
            .list()
            .iter()
            .map(|id| {
                let name = account.get(id).cloned();
                let local_tracks = name
                    .as_deref()
                    .map(|name| self.layout.playlist_dir(name, id))
                    .filter(|dir| dir.is_dir())
                    .and_then(|dir| Manifest::load(&dir).ok())
                    .map(|manifest| manifest.len());
                TrackedPlaylist {
                    id: id.clone(),
                    name,
                    local_tracks,
                }
            })
            .collect();

        Ok(tracked)
    }

    /// Track a playlist and sync it immediately
    pub async fn add(&mut self, playlist_id: &str) -> Result<AddOutcome> {
        let account = self.remote_playlists().await?;
        if !account.contains_key(playlist_id) {
            debug!("Refusing to track unknown playlist {}", playlist_id);
            return Ok(AddOutcome::NotFound);
        }

        let newly_added = self.registry.add(playlist_id)?;
        let report = match self.reconcile(playlist_id, &account).await {
            Ok(report) => report,
            Err(SyncError::PlaylistNotFound(_)) => {
                // Listed but unreadable, e.g. Spotify-owned playlists
                warn!("Playlist {} is listed but its tracks are not available", playlist_id);
                if newly_added {
                    self.registry.remove(playlist_id)?;
                }
                return Ok(AddOutcome::NotFound);
            }
            Err(e) => return Err(e).context("Failed to sync new playlist"),
        };

        Ok(if newly_added {
            AddOutcome::Added(report)
        } else {
            AddOutcome::AlreadyTracked(report)
        })
    }

    /// Reconcile every tracked playlist, one after another
    ///
    /// A playlist that fails is reported and the rest still run.
    pub async fn sync_all(&self) -> Result<Vec<(String, PlaylistOutcome)>> {
        let ids = self.registry.list().to_vec();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let account = self.remote_playlists().await?;
        let mut outcomes = Vec::with_capacity(ids.len());

        for id in ids {
            let outcome = match self.reconcile(&id, &account).await {
                Ok(report) => PlaylistOutcome::Synced(report),
                Err(SyncError::PlaylistNotFound(_)) => {
                    warn!("Playlist {} not found, skipping", id);
                    PlaylistOutcome::NotFound
                }
                Err(e) => {
                    error!("Failed to sync playlist {}: {}", id, e);
                    PlaylistOutcome::Failed(e.to_string())
                }
            };
            outcomes.push((id, outcome));
        }

        Ok(outcomes)
    }

    async fn reconcile(
        &self,
        playlist_id: &str,
        account: &BTreeMap<String, String>,
    ) -> Result<ReconcileReport, SyncError> {
        let progress = self.progress_bar();
        let reconciler = Reconciler::new(
            &self.layout,
            &*self.playlists,
            &*self.audio,
            self.options,
        )
        .with_progress(progress.clone());

        let result = reconciler.reconcile_listed(playlist_id, account).await;
        progress.finish_and_clear();
        result
    }

    fn progress_bar(&self) -> ProgressBar {
        let Some(multi) = &self.progress else {
            return ProgressBar::hidden();
        };

        let progress = multi.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress
    }
}
