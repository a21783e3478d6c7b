//! Spotify playlist source

pub mod auth;
pub mod client;
pub mod models;

pub use auth::SpotifyCredentials;
pub use client::SpotifyClient;
