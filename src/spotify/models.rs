//! Spotify Web API response models

use serde::Deserialize;

use crate::sync::TrackRef;

/// One page of a paginated listing
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Playlist as listed under the current user (GET /me/playlists)
#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
}

/// Playlist header (GET /playlists/{id}?fields=name)
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistHeader {
    pub name: String,
}

/// Entry of a playlist (GET /playlists/{id}/tracks)
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    /// Null for removed or unavailable tracks
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrack {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
}

impl PlaylistItem {
    /// Convert to a track reference, skipping entries without a playable track
    pub fn into_track_ref(self) -> Option<TrackRef> {
        let track = self.track?;
        let id = track.id?;
        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_else(|| "Unknown Artist".to_string());

        Some(TrackRef {
            id,
            name: track.name,
            artist,
            duration_seconds: u32::try_from(track.duration_ms / 1000).unwrap_or(u32::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track_page() {
        let json = r#"{
            "items": [
                {"track": {"id": "a1", "name": "Around the World",
                           "artists": [{"name": "Daft Punk"}, {"name": "Other"}],
                           "duration_ms": 429533}},
                {"track": null},
                {"track": {"id": null, "name": "Local File", "artists": [], "duration_ms": 1000}}
            ],
            "next": "https://api.spotify.com/v1/playlists/p/tracks?offset=100&limit=100"
        }"#;

        let page: Page<PlaylistItem> = serde_json::from_str(json).unwrap();
        assert!(page.next.is_some());

        let tracks: Vec<TrackRef> = page
            .items
            .into_iter()
            .filter_map(PlaylistItem::into_track_ref)
            .collect();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "a1");
        assert_eq!(tracks[0].artist, "Daft Punk");
        assert_eq!(tracks[0].duration_seconds, 429);
    }

    #[test]
    fn test_parse_playlist_page() {
        let json = r#"{"items": [{"id": "p1", "name": "Chill", "public": true}], "next": null}"#;
        let page: Page<SimplifiedPlaylist> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items[0].name, "Chill");
        assert!(page.next.is_none());
    }

    #[test]
    fn test_page_without_items_is_empty() {
        let page: Page<PlaylistItem> = serde_json::from_str(r#"{"next": null}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_missing_artist_defaults() {
        let item: PlaylistItem =
            serde_json::from_str(r#"{"track": {"id": "e1", "name": "Episode", "duration_ms": 60999}}"#)
                .unwrap();
        let track = item.into_track_ref().unwrap();
        assert_eq!(track.artist, "Unknown Artist");
        assert_eq!(track.duration_seconds, 60);
    }
}
