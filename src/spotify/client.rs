//! Spotify Web API HTTP client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::auth::{self, SpotifyCredentials, StoredToken, TokenStore};
use super::models::*;
use crate::sync::{PlaylistSource, RemotePlaylist, TrackRef};

const API_BASE: &str = "https://api.spotify.com/v1";

/// Attempts per request when rate limited
const MAX_ATTEMPTS: u32 = 3;

/// HTTP client for the Spotify Web API
pub struct SpotifyClient {
    http: Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<StoredToken>>,
}

impl SpotifyClient {
    /// Create a new Spotify client
    ///
    /// No request is made until the first call; authorization happens then.
    pub fn new(credentials: SpotifyCredentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("tunemirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Current access token, authorizing or refreshing as needed
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;

        if guard.is_none() {
            *guard = TokenStore::load()?;
        }

        let token = match guard.take() {
            Some(token) if !token.is_expired() => token,
            Some(StoredToken {
                refresh_token: Some(refresh_token),
                ..
            }) => match auth::refresh(&self.http, &self.credentials, &refresh_token).await {
                Ok(token) => {
                    TokenStore::store(&token)?;
                    token
                }
                Err(e) => {
                    warn!("Token refresh failed, re-authorizing: {:#}", e);
                    self.authorize().await?
                }
            },
            _ => self.authorize().await?,
        };

        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    async fn authorize(&self) -> Result<StoredToken> {
        let token = auth::authorize_interactively(&self.http, &self.credentials).await?;
        TokenStore::store(&token)?;
        Ok(token)
    }

    /// GET a JSON resource, `None` on 404
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let mut attempt = 1;
        loop {
            let token = self.access_token().await?;
            debug!("GET {}", url);

            let response = self
                .http
                .get(url)
                .bearer_auth(&token)
                .send()
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;

            match response.status() {
                StatusCode::NOT_FOUND => return Ok(None),
                StatusCode::TOO_MANY_REQUESTS if attempt < MAX_ATTEMPTS => {
                    let wait = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(1);
                    warn!("Rate limited by Spotify, retrying in {}s", wait);
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                StatusCode::UNAUTHORIZED if attempt < MAX_ATTEMPTS => {
                    debug!("Access token rejected, forcing refresh");
                    if let Some(token) = self.token.lock().await.as_mut() {
                        token.expires_at = chrono::Utc::now();
                    }
                    attempt += 1;
                }
                _ => {
                    let body = response
                        .error_for_status()
                        .with_context(|| format!("Spotify request failed: {}", url))?
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse response from {}", url))?;
                    return Ok(Some(body));
                }
            }
        }
    }

    /// Follow `next` links until the listing is exhausted
    async fn get_all<T: DeserializeOwned>(&self, first_url: String) -> Result<Option<Vec<T>>> {
        let mut items = Vec::new();
        let mut next = Some(first_url);

        while let Some(url) = next {
            let Some(page) = self.get_json::<Page<T>>(&url).await? else {
                return Ok(None);
            };
            items.extend(page.items);
            next = page.next;
        }

        Ok(Some(items))
    }
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn list_playlists(&self) -> Result<BTreeMap<String, String>> {
        let url = format!("{}/me/playlists?limit=50", API_BASE);
        let playlists: Vec<SimplifiedPlaylist> = self
            .get_all(url)
            .await?
            .context("Playlist listing not available")?;

        debug!("Found {} playlists", playlists.len());
        Ok(playlists.into_iter().map(|p| (p.id, p.name)).collect())
    }

    async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Option<RemotePlaylist>> {
        let id = urlencoding::encode(playlist_id);

        let header_url = format!("{}/playlists/{}?fields=name", API_BASE, id);
        let Some(header) = self.get_json::<PlaylistHeader>(&header_url).await? else {
            return Ok(None);
        };

        let tracks_url = format!("{}/playlists/{}/tracks?limit=100", API_BASE, id);
        let Some(items) = self.get_all::<PlaylistItem>(tracks_url).await? else {
            return Ok(None);
        };

        let total = items.len();
        let tracks: Vec<TrackRef> = items
            .into_iter()
            .filter_map(PlaylistItem::into_track_ref)
            .collect();
        if tracks.len() < total {
            debug!(
                "Skipped {} unavailable entries in {}",
                total - tracks.len(),
                header.name
            );
        }

        Ok(Some(RemotePlaylist {
            name: header.name,
            tracks,
        }))
    }
}
