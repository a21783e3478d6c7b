//! Sync engine module

pub mod engine;
pub mod error;
pub mod matcher;
pub mod reconcile;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{AddOutcome, PlaylistOutcome, SyncEngine};
pub use reconcile::{ReconcileOptions, ReconcileReport};
pub use source::{AudioSource, PlaylistSource, RemotePlaylist, SearchCandidate, TrackRef};
