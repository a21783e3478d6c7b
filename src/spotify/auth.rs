//! Spotify authorization
//!
//! Uses the authorization code flow. The user opens the authorize URL, approves
//! access and pastes back the URL they were redirected to. Tokens are kept in
//! the system keyring and refreshed when they expire.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use dialoguer::Input;
use keyring::Entry;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::models::TokenResponse;

const KEYRING_SERVICE: &str = "tunemirror";
const TOKEN_ENTRY: &str = "spotify:token";

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Read access to the user's own and collaborative playlists
pub const SCOPES: &str = "playlist-read-private playlist-read-collaborative";

/// Application credentials registered with Spotify
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Access token persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    /// Build from a token response, keeping the old refresh token if none was issued
    fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        }
    }

    /// Expired or about to expire within a minute
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(60) >= self.expires_at
    }
}

/// Keyring storage for the Spotify token
pub struct TokenStore;

impl TokenStore {
    pub fn load() -> Result<Option<StoredToken>> {
        match Self::entry()?.get_password() {
            Ok(json) => {
                let token = serde_json::from_str(&json).context("Stored Spotify token is corrupt")?;
                debug!("Loaded Spotify token from keyring");
                Ok(Some(token))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read Spotify token from keyring"),
        }
    }

    pub fn store(token: &StoredToken) -> Result<()> {
        let json = serde_json::to_string(token).context("Failed to serialize token")?;
        Self::entry()?
            .set_password(&json)
            .context("Failed to store Spotify token in keyring")?;
        debug!("Spotify token stored in keyring");
        Ok(())
    }

    fn entry() -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, TOKEN_ENTRY).context("Failed to access keyring")
    }
}

/// Random value tying the redirect back to this request (16 alphanumeric characters)
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// URL the user opens to grant access
pub fn authorize_url(creds: &SpotifyCredentials, state: &str) -> String {
    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
        AUTHORIZE_URL,
        urlencoding::encode(&creds.client_id),
        urlencoding::encode(&creds.redirect_uri),
        urlencoding::encode(SCOPES),
        urlencoding::encode(state)
    )
}

/// Pull the authorization code out of the redirected URL
pub fn extract_code(redirected: &str, expected_state: &str) -> Result<String> {
    let url = url::Url::parse(redirected.trim()).context("Not a valid URL")?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => anyhow::bail!("Spotify denied access: {}", value),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        anyhow::bail!("State mismatch in redirect URL");
    }
    code.ok_or_else(|| anyhow::anyhow!("No authorization code in redirect URL"))
}

/// Walk the user through granting access and return a fresh token
pub async fn authorize_interactively(
    http: &Client,
    creds: &SpotifyCredentials,
) -> Result<StoredToken> {
    let state = generate_state();

    println!("{}", "Spotify authorization required.".cyan());
    println!("Open this URL in your browser and approve access:");
    println!();
    println!("  {}", authorize_url(creds, &state));
    println!();

    let redirected: String = Input::new()
        .with_prompt("Paste the URL you were redirected to")
        .interact_text()
        .context("Failed to read redirect URL")?;

    let code = extract_code(&redirected, &state)?;
    let token = exchange_code(http, creds, &code).await?;
    info!("Spotify authorization complete");
    Ok(token)
}

/// Trade an authorization code for a token
pub async fn exchange_code(
    http: &Client,
    creds: &SpotifyCredentials,
    code: &str,
) -> Result<StoredToken> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", creds.redirect_uri.as_str()),
    ];
    let response = request_token(http, creds, &params).await?;
    Ok(StoredToken::from_response(response, None))
}

/// Obtain a new access token from a refresh token
pub async fn refresh(
    http: &Client,
    creds: &SpotifyCredentials,
    refresh_token: &str,
) -> Result<StoredToken> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];
    let response = request_token(http, creds, &params).await?;
    debug!("Refreshed Spotify access token");
    Ok(StoredToken::from_response(
        response,
        Some(refresh_token.to_string()),
    ))
}

async fn request_token(
    http: &Client,
    creds: &SpotifyCredentials,
    params: &[(&str, &str)],
) -> Result<TokenResponse> {
    http.post(TOKEN_URL)
        .basic_auth(&creds.client_id, Some(&creds.client_secret))
        .form(params)
        .send()
        .await
        .context("Failed to reach Spotify token endpoint")?
        .error_for_status()
        .context("Spotify rejected the token request")?
        .json()
        .await
        .context("Failed to parse token response")
}
