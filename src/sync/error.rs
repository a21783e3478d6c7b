//! Errors that abort the reconciliation of a single playlist

use thiserror::Error;

use crate::library::ManifestError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("playlist {0} not found on the account")]
    PlaylistNotFound(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("playlist source failed: {0:#}")]
    Remote(anyhow::Error),

    #[error("library I/O failed: {0:#}")]
    Io(anyhow::Error),
}
