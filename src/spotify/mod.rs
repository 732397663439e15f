//! # Spotify Integration Module
//!
//! The primary integration layer between replaycli and the Spotify Web API:
//! authentication, listening-history retrieval and playlist management.
//!
//! ## Submodules
//!
//! - [`auth`] - OAuth 2.0 authorization-code flow (browser-redirect and
//!   manual copy-paste variants), token refresh and session establishment
//! - [`history`] - Backward pagination over the recently-played endpoint
//!   with day-window filtering
//! - [`playlist`] - Playlist creation, batched track additions and track
//!   listing
//!
//! ## Rate limiting
//!
//! All endpoint wrappers go through [`SpotifyClient`], which classifies
//! 429 responses into [`ApiError::RateLimited`] carrying the provider's
//! `Retry-After` value. Rate limiting is the only error class callers retry;
//! anything else aborts the current operation.
//!
//! ## API coverage
//!
//! - `GET /me/player/recently-played` - paginated via `limit`/`before`
//! - `POST /me/playlists` - playlist creation
//! - `POST /playlists/{id}/tracks` - batched track additions
//! - `GET /playlists/{id}/tracks` - paginated via `offset`/`limit`
//! - `POST <accounts>/api/token` - code exchange and refresh

pub mod auth;
pub mod history;
pub mod playlist;

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Authenticated handle for Spotify Web API calls. Produced by the auth
/// session and consumed by the history fetcher and playlist builder.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    access_token: String,
}

impl SpotifyClient {
    pub fn new(api_url: String, access_token: String) -> Self {
        SpotifyClient {
            http: Client::new(),
            api_url,
            access_token,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = classify(response)?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        let response = classify(response)?;
        Ok(response.json::<T>().await?)
    }
}

/// Sorts an API response into the error taxonomy: 429 becomes
/// [`ApiError::RateLimited`] with the parsed `Retry-After` seconds, any
/// other non-success status becomes [`ApiError::Provider`].
fn classify(response: Response) -> Result<Response, ApiError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        return Err(ApiError::RateLimited { retry_after_secs });
    }

    if !status.is_success() {
        return Err(ApiError::Provider(format!(
            "{} from {}",
            status,
            response.url()
        )));
    }

    Ok(response)
}
