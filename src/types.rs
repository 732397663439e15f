use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One play of a track, as assembled from the recently-played endpoint.
/// Ephemeral: created per fetch, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub played_at: DateTime<Utc>,
}

/// The persisted OAuth token record. Serialized camelCase so the on-disk
/// file stays compatible with `.spotify-tokens.json` as written by earlier
/// versions of this tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry instant, milliseconds since the Unix epoch.
    pub expires_at: i64,
}

impl TokenRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp_millis()
    }
}

/// Minimal description of a created playlist. The remote service is
/// authoritative; nothing is stored locally.
#[derive(Debug, Clone)]
pub struct PlaylistInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Shared state between the auth flow and the one-shot callback handler.
#[derive(Debug)]
pub struct AuthCallback {
    /// The opaque state token issued when the flow started. The callback
    /// must echo it back exactly.
    pub expected_state: String,
    /// Outcome written by the callback handler: the authorization code on
    /// success, a descriptive message on rejection.
    pub outcome: Option<Result<String, String>>,
}

impl AuthCallback {
    pub fn new(expected_state: String) -> Self {
        AuthCallback {
            expected_state,
            outcome: None,
        }
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub index: usize,
    pub time: String,
    pub name: String,
    pub artists: String,
}

// --- Spotify Web API wire types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Absent on refresh responses unless the provider rotates the token.
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentlyPlayedResponse {
    #[serde(default)]
    pub items: Vec<PlayHistoryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistoryItem {
    pub track: Option<PlayedTrack>,
    pub played_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayedTrack {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    /// Spotify object type; the history endpoint can also return episodes.
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksResponse {
    #[serde(default)]
    pub items: Vec<PlaylistTrackItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackItem {
    pub track: Option<PlaylistTrackRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackRef {
    pub id: Option<String>,
}
