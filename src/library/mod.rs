//! Local library state: layout, manifests and the tracked playlist registry

pub mod layout;
pub mod manifest;
pub mod registry;

pub use layout::{track_file_name, LibraryLayout};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
pub use registry::PlaylistRegistry;
