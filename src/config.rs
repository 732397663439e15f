//! Configuration management for the listening-history playlist CLI.
//!
//! Configuration is environment-sourced. A `.env` file is honored from the
//! platform-specific local data directory (`replaycli/.env`) when present,
//! falling back to one in the working directory. Only the Spotify client id
//! and secret are required; everything else carries a sensible default.

use std::{env, path::PathBuf};

use crate::error::ApiError;

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:3000/callback";
const DEFAULT_TOKEN_FILE: &str = ".spotify-tokens.json";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// Resolved application configuration. Built once, before any network
/// activity, and passed down to the auth session.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub token_file: PathBuf,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// Upper bound on how long the redirect-mode flow waits for the browser
    /// callback before giving up.
    pub callback_timeout_secs: u64,
}

/// Loads environment variables from a `.env` file if one exists.
///
/// Looks in the local data directory first (e.g. `~/.local/share/replaycli/.env`
/// on Linux), then in the current working directory. Absence of both is not
/// an error; variables may be set in the environment directly.
pub async fn load_env() {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("replaycli/.env");

    if async_fs::metadata(&path).await.is_ok() {
        let _ = dotenv::from_path(&path);
    } else {
        let _ = dotenv::dotenv();
    }
}

impl Config {
    /// Builds the configuration from the environment.
    ///
    /// Fails with [`ApiError::Config`] when `SPOTIFY_CLIENT_ID` or
    /// `SPOTIFY_CLIENT_SECRET` is missing; this is surfaced before any
    /// request is made.
    pub fn from_env() -> Result<Self, ApiError> {
        let client_id = require("SPOTIFY_CLIENT_ID")?;
        let client_secret = require("SPOTIFY_CLIENT_SECRET")?;

        Ok(Config {
            client_id,
            client_secret,
            redirect_uri: var_or("SPOTIFY_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            token_file: PathBuf::from(var_or("SPOTIFY_TOKEN_FILE", DEFAULT_TOKEN_FILE)),
            auth_url: var_or("SPOTIFY_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: var_or("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: var_or("SPOTIFY_API_URL", DEFAULT_API_URL),
            callback_timeout_secs: env::var("REPLAYCLI_CALLBACK_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CALLBACK_TIMEOUT_SECS),
        })
    }

    /// The port the local callback listener binds, taken from the redirect
    /// URI. Defaults to 3000 when the URI carries no explicit port.
    pub fn callback_port(&self) -> u16 {
        reqwest::Url::parse(&self.redirect_uri)
            .ok()
            .and_then(|url| url.port())
            .unwrap_or(3000)
    }

    /// The path component of the redirect URI, which the callback listener
    /// serves. The path itself is arbitrary; it only has to match what is
    /// registered with the provider.
    pub fn callback_path(&self) -> String {
        reqwest::Url::parse(&self.redirect_uri)
            .map(|url| url.path().to_string())
            .ok()
            .filter(|path| !path.is_empty() && path != "/")
            .unwrap_or_else(|| "/callback".to_string())
    }
}

fn require(name: &str) -> Result<String, ApiError> {
    env::var(name).map_err(|_| {
        ApiError::Config(format!(
            "missing required environment variable {}. Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET in the environment or a .env file.",
            name
        ))
    })
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
